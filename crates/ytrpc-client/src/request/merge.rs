use serde::Serialize;
use serde_json::Value;
use ytrpc_common::protocol::wire::{ReqStartOperation, RspStartOperation};
use ytrpc_common::{MergeMode, Result, RichYPath, YPath, YtError};

use super::options::{MutatingDraft, MutatingOptions};
use super::{Operation, RequestBuilder};

/// Starts a merge operation over one or more input tables.
///
/// Travels as `start_operation` with operation type `merge`; the options end
/// up in the operation spec.
///
/// # Example
///
/// ```
/// use ytrpc_client::request::StartMerge;
/// use ytrpc_common::{KeyBound, MergeMode, RichYPath, TableRange, YPath};
/// use serde_json::json;
///
/// let input = RichYPath::new(YPath::new("//tmp/events").unwrap())
///     .with_range(TableRange::new(Some(KeyBound::of(&[json!(100)])), None));
///
/// let request = StartMerge::builder()
///     .add_input_table(input)
///     .with_output_table(YPath::new("//tmp/merged").unwrap())
///     .with_mode(MergeMode::Sorted)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.operation().mode(), MergeMode::Sorted);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StartMerge {
    input_tables: Vec<RichYPath>,
    output_table: YPath,
    mode: MergeMode,
    combine_chunks: bool,
    merge_by: Vec<String>,
    mutating_options: MutatingOptions,
}

#[derive(Debug, Clone, Default)]
pub struct StartMergeDraft {
    pub input_tables: Vec<RichYPath>,
    pub output_table: Option<YPath>,
    pub mode: Option<MergeMode>,
    pub combine_chunks: bool,
    pub merge_by: Vec<String>,
    pub mutating_options: MutatingOptions,
}

impl MutatingDraft for StartMergeDraft {
    fn mutating_options_mut(&mut self) -> &mut MutatingOptions {
        &mut self.mutating_options
    }
}

#[derive(Serialize)]
struct MergeSpec<'a> {
    input_table_paths: Vec<Value>,
    output_table_path: &'a str,
    mode: MergeMode,
    combine_chunks: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    merge_by: &'a [String],
}

impl StartMerge {
    pub const OPERATION_TYPE: &'static str = "merge";

    pub fn builder() -> RequestBuilder<Self> {
        RequestBuilder::new()
    }

    pub fn input_tables(&self) -> &[RichYPath] {
        &self.input_tables
    }

    pub fn output_table(&self) -> &YPath {
        &self.output_table
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    pub fn combine_chunks(&self) -> bool {
        self.combine_chunks
    }

    pub fn merge_by(&self) -> &[String] {
        &self.merge_by
    }

    fn spec(&self) -> Result<Value> {
        let spec = MergeSpec {
            input_table_paths: self.input_tables.iter().map(RichYPath::to_wire).collect(),
            output_table_path: self.output_table.as_str(),
            mode: self.mode,
            combine_chunks: self.combine_chunks,
            merge_by: &self.merge_by,
        };
        Ok(serde_json::to_value(spec)?)
    }
}

impl RequestBuilder<StartMerge> {
    pub fn add_input_table(mut self, table: impl Into<RichYPath>) -> Self {
        self.draft_mut().input_tables.push(table.into());
        self
    }

    /// Replaces every input table added so far.
    pub fn with_input_tables(mut self, tables: Vec<RichYPath>) -> Self {
        self.draft_mut().input_tables = tables;
        self
    }

    pub fn with_output_table(mut self, table: YPath) -> Self {
        self.draft_mut().output_table = Some(table);
        self
    }

    pub fn with_mode(mut self, mode: MergeMode) -> Self {
        self.draft_mut().mode = Some(mode);
        self
    }

    pub fn with_combine_chunks(mut self, combine_chunks: bool) -> Self {
        self.draft_mut().combine_chunks = combine_chunks;
        self
    }

    pub fn with_merge_by(mut self, columns: Vec<String>) -> Self {
        self.draft_mut().merge_by = columns;
        self
    }
}

impl Operation for StartMerge {
    type Draft = StartMergeDraft;
    type Body = ReqStartOperation;
    type Response = RspStartOperation;

    const METHOD: &'static str = "start_operation";

    fn from_draft(draft: StartMergeDraft) -> Result<Self> {
        if draft.input_tables.is_empty() {
            return Err(YtError::IncompleteRequest {
                method: Self::METHOD,
                field: "input_table_paths",
            });
        }
        let output_table = draft.output_table.ok_or(YtError::IncompleteRequest {
            method: Self::METHOD,
            field: "output_table_path",
        })?;
        Ok(Self {
            input_tables: draft.input_tables,
            output_table,
            mode: draft.mode.unwrap_or(MergeMode::Unordered),
            combine_chunks: draft.combine_chunks,
            merge_by: draft.merge_by,
            mutating_options: draft.mutating_options,
        })
    }

    fn to_draft(&self) -> StartMergeDraft {
        StartMergeDraft {
            input_tables: self.input_tables.clone(),
            output_table: Some(self.output_table.clone()),
            mode: Some(self.mode),
            combine_chunks: self.combine_chunks,
            merge_by: self.merge_by.clone(),
            mutating_options: self.mutating_options.clone(),
        }
    }

    fn write_body(&self, body: &mut ReqStartOperation) -> Result<()> {
        body.operation_type = Self::OPERATION_TYPE.to_string();
        body.spec = self.spec()?;
        body.mutating_options = Some(self.mutating_options.to_wire());
        Ok(())
    }
}
