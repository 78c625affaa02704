//! FIFO allocation over ordered buckets.
//!
//! Every variant of the engine (loan and cash-advance repayment, deposit and
//! sale liquidation, stock withdrawal, transfers) distributes an amount or
//! quantity through the single allocator in [`fifo`]. Callers build an
//! [`OrderedBuckets`] from their pending documents; the allocator never sees
//! unsorted input.

pub mod fifo;

#[cfg(test)]
mod props;

pub use fifo::{
    Allocation, AllocationError, Bucket, OrderedBuckets, allocate, allocate_available,
};
