use uuid::Uuid;
use ytrpc_common::protocol::wire;
use ytrpc_common::YPath;

use super::{Operation, RequestBuilder};

/// Options of calls that change cluster state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutatingOptions {
    pub mutation_id: Option<Uuid>,
    /// Marks a resend of a mutation the server may already have applied.
    pub retry: bool,
}

impl MutatingOptions {
    pub fn new(mutation_id: Uuid) -> Self {
        Self {
            mutation_id: Some(mutation_id),
            retry: false,
        }
    }

    /// Every mutation carries an id so the server can deduplicate resends.
    pub(crate) fn to_wire(&self) -> wire::MutatingOptions {
        wire::MutatingOptions {
            mutation_id: Some(self.mutation_id.unwrap_or_else(Uuid::new_v4)),
            retry: self.retry,
        }
    }
}

/// Restricts a tablet call to `[first_tablet_index, last_tablet_index]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabletRangeOptions {
    pub first_tablet_index: Option<i32>,
    pub last_tablet_index: Option<i32>,
}

impl TabletRangeOptions {
    pub fn new(first_tablet_index: Option<i32>, last_tablet_index: Option<i32>) -> Self {
        Self {
            first_tablet_index,
            last_tablet_index,
        }
    }

    pub(crate) fn to_wire(self) -> wire::TabletRangeOptions {
        wire::TabletRangeOptions {
            first_tablet_index: self.first_tablet_index,
            last_tablet_index: self.last_tablet_index,
        }
    }
}

/// Draft of an operation addressed by a Cypress path.
pub trait PathDraft {
    fn path_mut(&mut self) -> &mut Option<YPath>;
}

/// Draft of an operation that accepts [`MutatingOptions`].
pub trait MutatingDraft {
    fn mutating_options_mut(&mut self) -> &mut MutatingOptions;
}

/// Draft of an operation that accepts [`TabletRangeOptions`].
pub trait TabletRangeDraft {
    fn tablet_range_options_mut(&mut self) -> &mut Option<TabletRangeOptions>;
}

impl<O: Operation> RequestBuilder<O>
where
    O::Draft: PathDraft,
{
    pub fn with_path(mut self, path: YPath) -> Self {
        *self.draft_mut().path_mut() = Some(path);
        self
    }
}

impl<O: Operation> RequestBuilder<O>
where
    O::Draft: MutatingDraft,
{
    pub fn with_mutating_options(mut self, options: MutatingOptions) -> Self {
        *self.draft_mut().mutating_options_mut() = options;
        self
    }

    pub fn with_mutation_id(mut self, mutation_id: Uuid) -> Self {
        self.draft_mut().mutating_options_mut().mutation_id = Some(mutation_id);
        self
    }
}

impl<O: Operation> RequestBuilder<O>
where
    O::Draft: TabletRangeDraft,
{
    pub fn with_tablet_range_options(mut self, options: TabletRangeOptions) -> Self {
        *self.draft_mut().tablet_range_options_mut() = Some(options);
        self
    }
}
