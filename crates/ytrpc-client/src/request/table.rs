//! Tablet management calls: mount, unmount and remount of dynamic tables.

use uuid::Uuid;
use ytrpc_common::protocol::wire::{ReqMountTable, ReqRemountTable, ReqUnmountTable, RspEmpty};
use ytrpc_common::{Result, YPath, YtError};

use super::options::{MutatingDraft, MutatingOptions, PathDraft, TabletRangeDraft, TabletRangeOptions};
use super::{Operation, Request, RequestBuilder};

/// Builder state shared by every tablet call.
#[derive(Debug, Clone, Default)]
pub struct TableDraft {
    pub path: Option<YPath>,
    pub mutating_options: MutatingOptions,
    pub tablet_range_options: Option<TabletRangeOptions>,
}

impl PathDraft for TableDraft {
    fn path_mut(&mut self) -> &mut Option<YPath> {
        &mut self.path
    }
}

impl MutatingDraft for TableDraft {
    fn mutating_options_mut(&mut self) -> &mut MutatingOptions {
        &mut self.mutating_options
    }
}

impl TabletRangeDraft for TableDraft {
    fn tablet_range_options_mut(&mut self) -> &mut Option<TabletRangeOptions> {
        &mut self.tablet_range_options
    }
}

/// Validated fields shared by every tablet call.
#[derive(Debug, Clone, PartialEq)]
struct TableFields {
    path: YPath,
    mutating_options: MutatingOptions,
    tablet_range_options: Option<TabletRangeOptions>,
}

impl TableFields {
    fn new(path: YPath) -> Self {
        Self {
            path,
            mutating_options: MutatingOptions::default(),
            tablet_range_options: None,
        }
    }

    fn from_draft(method: &'static str, draft: TableDraft) -> Result<Self> {
        let path = draft
            .path
            .ok_or(YtError::IncompleteRequest { method, field: "path" })?;
        Ok(Self {
            path,
            mutating_options: draft.mutating_options,
            tablet_range_options: draft.tablet_range_options,
        })
    }

    fn to_draft(&self) -> TableDraft {
        TableDraft {
            path: Some(self.path.clone()),
            mutating_options: self.mutating_options.clone(),
            tablet_range_options: self.tablet_range_options,
        }
    }
}

// Expands to the draft plumbing of a tablet call whose draft wraps a `TableDraft`.
macro_rules! table_draft_mixins {
    ($draft:ty) => {
        impl PathDraft for $draft {
            fn path_mut(&mut self) -> &mut Option<YPath> {
                &mut self.table.path
            }
        }

        impl MutatingDraft for $draft {
            fn mutating_options_mut(&mut self) -> &mut MutatingOptions {
                &mut self.table.mutating_options
            }
        }

        impl TabletRangeDraft for $draft {
            fn tablet_range_options_mut(&mut self) -> &mut Option<TabletRangeOptions> {
                &mut self.table.tablet_range_options
            }
        }
    };
}

/// Mounts the tablets of a dynamic table.
#[derive(Debug, Clone, PartialEq)]
pub struct MountTable {
    table: TableFields,
    cell_id: Option<Uuid>,
    freeze: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MountTableDraft {
    pub table: TableDraft,
    pub cell_id: Option<Uuid>,
    pub freeze: bool,
}

table_draft_mixins!(MountTableDraft);

impl MountTable {
    pub fn builder() -> RequestBuilder<Self> {
        RequestBuilder::new()
    }

    /// Request with default options for mounting `path`.
    pub fn new(path: YPath) -> Request<Self> {
        Request::from_operation(Self {
            table: TableFields::new(path),
            cell_id: None,
            freeze: false,
        })
    }

    pub fn path(&self) -> &YPath {
        &self.table.path
    }

    pub fn cell_id(&self) -> Option<Uuid> {
        self.cell_id
    }

    pub fn freeze(&self) -> bool {
        self.freeze
    }

    pub fn tablet_range_options(&self) -> Option<TabletRangeOptions> {
        self.table.tablet_range_options
    }
}

impl RequestBuilder<MountTable> {
    /// Mounts the tablets on the given tablet cell.
    pub fn with_cell_id(mut self, cell_id: Uuid) -> Self {
        self.draft_mut().cell_id = Some(cell_id);
        self
    }

    pub fn with_freeze(mut self, freeze: bool) -> Self {
        self.draft_mut().freeze = freeze;
        self
    }
}

impl Operation for MountTable {
    type Draft = MountTableDraft;
    type Body = ReqMountTable;
    type Response = RspEmpty;

    const METHOD: &'static str = "mount_table";

    fn from_draft(draft: MountTableDraft) -> Result<Self> {
        Ok(Self {
            table: TableFields::from_draft(Self::METHOD, draft.table)?,
            cell_id: draft.cell_id,
            freeze: draft.freeze,
        })
    }

    fn to_draft(&self) -> MountTableDraft {
        MountTableDraft {
            table: self.table.to_draft(),
            cell_id: self.cell_id,
            freeze: self.freeze,
        }
    }

    fn write_body(&self, body: &mut ReqMountTable) -> Result<()> {
        body.path = self.table.path.to_string();
        body.mutating_options = Some(self.table.mutating_options.to_wire());
        body.tablet_range_options = self.table.tablet_range_options.map(TabletRangeOptions::to_wire);
        body.cell_id = self.cell_id;
        body.freeze = self.freeze;
        Ok(())
    }
}

/// Unmounts the tablets of a dynamic table.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmountTable {
    table: TableFields,
    force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UnmountTableDraft {
    pub table: TableDraft,
    pub force: bool,
}

table_draft_mixins!(UnmountTableDraft);

impl UnmountTable {
    pub fn builder() -> RequestBuilder<Self> {
        RequestBuilder::new()
    }

    pub fn new(path: YPath) -> Request<Self> {
        Request::from_operation(Self {
            table: TableFields::new(path),
            force: false,
        })
    }

    pub fn path(&self) -> &YPath {
        &self.table.path
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn tablet_range_options(&self) -> Option<TabletRangeOptions> {
        self.table.tablet_range_options
    }
}

impl RequestBuilder<UnmountTable> {
    /// Unmounts without flushing dynamic stores. Unflushed data is lost.
    pub fn with_force(mut self, force: bool) -> Self {
        self.draft_mut().force = force;
        self
    }
}

impl Operation for UnmountTable {
    type Draft = UnmountTableDraft;
    type Body = ReqUnmountTable;
    type Response = RspEmpty;

    const METHOD: &'static str = "unmount_table";

    fn from_draft(draft: UnmountTableDraft) -> Result<Self> {
        Ok(Self {
            table: TableFields::from_draft(Self::METHOD, draft.table)?,
            force: draft.force,
        })
    }

    fn to_draft(&self) -> UnmountTableDraft {
        UnmountTableDraft {
            table: self.table.to_draft(),
            force: self.force,
        }
    }

    fn write_body(&self, body: &mut ReqUnmountTable) -> Result<()> {
        body.path = self.table.path.to_string();
        body.mutating_options = Some(self.table.mutating_options.to_wire());
        body.tablet_range_options = self.table.tablet_range_options.map(TabletRangeOptions::to_wire);
        body.force = self.force;
        Ok(())
    }
}

/// Applies changed table settings to mounted tablets.
#[derive(Debug, Clone, PartialEq)]
pub struct RemountTable {
    table: TableFields,
}

impl RemountTable {
    pub fn builder() -> RequestBuilder<Self> {
        RequestBuilder::new()
    }

    pub fn new(path: YPath) -> Request<Self> {
        Request::from_operation(Self {
            table: TableFields::new(path),
        })
    }

    pub fn path(&self) -> &YPath {
        &self.table.path
    }

    pub fn mutating_options(&self) -> &MutatingOptions {
        &self.table.mutating_options
    }

    pub fn tablet_range_options(&self) -> Option<TabletRangeOptions> {
        self.table.tablet_range_options
    }
}

impl Operation for RemountTable {
    type Draft = TableDraft;
    type Body = ReqRemountTable;
    type Response = RspEmpty;

    const METHOD: &'static str = "remount_table";

    fn from_draft(draft: TableDraft) -> Result<Self> {
        Ok(Self {
            table: TableFields::from_draft(Self::METHOD, draft)?,
        })
    }

    fn to_draft(&self) -> TableDraft {
        self.table.to_draft()
    }

    fn write_body(&self, body: &mut ReqRemountTable) -> Result<()> {
        body.path = self.table.path.to_string();
        body.mutating_options = Some(self.table.mutating_options.to_wire());
        body.tablet_range_options = self.table.tablet_range_options.map(TabletRangeOptions::to_wire);
        Ok(())
    }
}
