//! Query Pools
//!
//! Occlusion and timestamp queries are recorded inside passes and polled
//! afterwards. Polling never blocks: [`QueryPool::result`] returns `None`
//! until the backend makes the value available, and the caller simply stops
//! polling when it gives up.

use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::{NativeContext, RawQueryPool};
use crate::errors::{PrismError, Result};
use crate::format::QueryKind;

use super::{ResourceCore, ResourceId, ResourceKind, ResourceRegistry};

/// Query-pool creation options.
#[derive(Debug, Clone, Copy)]
pub struct QueryPoolDescriptor<'a> {
    pub kind: QueryKind,
    /// Number of query slots in the pool.
    pub count: u32,
    pub label: Option<&'a str>,
}

/// A fixed-size pool of query slots.
pub struct QueryPool {
    core: ResourceCore,
    handle: RawQueryPool,
    kind: QueryKind,
    count: u32,
}

impl QueryPool {
    pub(crate) fn new(
        ctx: Rc<dyn NativeContext>,
        registry: &Rc<RefCell<ResourceRegistry>>,
        desc: &QueryPoolDescriptor<'_>,
    ) -> Result<Self> {
        if desc.count == 0 {
            return Err(PrismError::InvalidDescriptor(
                "query pool must hold at least one slot".into(),
            ));
        }
        let handle = ctx.create_query_pool(desc.kind, desc.count)?;
        Ok(Self {
            core: ResourceCore::register(ctx, registry, ResourceKind::QueryPool, desc.label),
            handle,
            kind: desc.kind,
            count: desc.count,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.core.id()
    }

    #[must_use]
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    /// Non-blocking poll of one query slot. `None` while the result is not
    /// yet available; re-poll until it is, or give up.
    pub fn result(&self, index: u32) -> Result<Option<u64>> {
        self.core.ensure_alive()?;
        if index >= self.count {
            return Err(PrismError::QueryIndexOutOfRange {
                index,
                count: self.count,
            });
        }
        Ok(self.core.ctx().query_result(self.handle, index))
    }

    pub(crate) fn raw(&self) -> Result<RawQueryPool> {
        self.core.ensure_alive()?;
        Ok(self.handle)
    }

    pub fn destroy(&self) -> Result<()> {
        self.core.release()?;
        self.core.ctx().destroy_query_pool(self.handle);
        Ok(())
    }
}
