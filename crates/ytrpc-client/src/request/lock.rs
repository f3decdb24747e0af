use ytrpc_common::protocol::wire::{ReqLockNode, RspLockNode};
use ytrpc_common::{LockMode, ProtoEnum, Result, YPath, YtError};

use super::options::{MutatingDraft, MutatingOptions, PathDraft};
use super::{Operation, Request, RequestBuilder};

/// Takes a lock on a Cypress node.
///
/// The mode defaults to [`LockMode::Exclusive`]. Child and attribute keys
/// narrow a shared lock to one map child or one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct LockNode {
    path: YPath,
    mode: LockMode,
    waitable: bool,
    child_key: Option<String>,
    attribute_key: Option<String>,
    mutating_options: MutatingOptions,
}

#[derive(Debug, Clone, Default)]
pub struct LockNodeDraft {
    pub path: Option<YPath>,
    pub mode: Option<LockMode>,
    pub waitable: bool,
    pub child_key: Option<String>,
    pub attribute_key: Option<String>,
    pub mutating_options: MutatingOptions,
}

impl PathDraft for LockNodeDraft {
    fn path_mut(&mut self) -> &mut Option<YPath> {
        &mut self.path
    }
}

impl MutatingDraft for LockNodeDraft {
    fn mutating_options_mut(&mut self) -> &mut MutatingOptions {
        &mut self.mutating_options
    }
}

impl LockNode {
    pub fn builder() -> RequestBuilder<Self> {
        RequestBuilder::new()
    }

    pub fn new(path: YPath, mode: LockMode) -> Request<Self> {
        Request::from_operation(Self {
            path,
            mode,
            waitable: false,
            child_key: None,
            attribute_key: None,
            mutating_options: MutatingOptions::default(),
        })
    }

    pub fn path(&self) -> &YPath {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn waitable(&self) -> bool {
        self.waitable
    }

    pub fn child_key(&self) -> Option<&str> {
        self.child_key.as_deref()
    }

    pub fn attribute_key(&self) -> Option<&str> {
        self.attribute_key.as_deref()
    }
}

impl RequestBuilder<LockNode> {
    pub fn with_mode(mut self, mode: LockMode) -> Self {
        self.draft_mut().mode = Some(mode);
        self
    }

    /// Queue behind conflicting locks instead of failing.
    pub fn with_waitable(mut self, waitable: bool) -> Self {
        self.draft_mut().waitable = waitable;
        self
    }

    pub fn with_child_key(mut self, key: impl Into<String>) -> Self {
        self.draft_mut().child_key = Some(key.into());
        self
    }

    pub fn with_attribute_key(mut self, key: impl Into<String>) -> Self {
        self.draft_mut().attribute_key = Some(key.into());
        self
    }
}

impl Operation for LockNode {
    type Draft = LockNodeDraft;
    type Body = ReqLockNode;
    type Response = RspLockNode;

    const METHOD: &'static str = "lock_node";

    fn from_draft(draft: LockNodeDraft) -> Result<Self> {
        let path = draft.path.ok_or(YtError::IncompleteRequest {
            method: Self::METHOD,
            field: "path",
        })?;
        Ok(Self {
            path,
            mode: draft.mode.unwrap_or(LockMode::Exclusive),
            waitable: draft.waitable,
            child_key: draft.child_key,
            attribute_key: draft.attribute_key,
            mutating_options: draft.mutating_options,
        })
    }

    fn to_draft(&self) -> LockNodeDraft {
        LockNodeDraft {
            path: Some(self.path.clone()),
            mode: Some(self.mode),
            waitable: self.waitable,
            child_key: self.child_key.clone(),
            attribute_key: self.attribute_key.clone(),
            mutating_options: self.mutating_options.clone(),
        }
    }

    fn write_body(&self, body: &mut ReqLockNode) -> Result<()> {
        body.path = self.path.to_string();
        body.mode = self.mode.proto_value();
        body.waitable = self.waitable;
        body.child_key = self.child_key.clone();
        body.attribute_key = self.attribute_key.clone();
        body.mutating_options = Some(self.mutating_options.to_wire());
        Ok(())
    }
}
