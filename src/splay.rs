//! Work-distribution heuristic for 1-d elementwise dispatches.
//!
//! Maps an arbitrary element count onto a bounded grid of workgroups: small
//! problems get a single group, mid-sized problems get one minimum-width
//! group per chunk, and large problems saturate the grid and let each thread
//! stride over multiple elements.

/// Narrowest useful workgroup. Warp-sized.
pub const MIN_GROUP_THREADS: usize = 32;
pub const MAX_GROUP_THREADS: usize = 128;
pub const MAX_GROUPS: usize = 80;

/// Launch geometry for a 1-d elementwise dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchShape {
    pub group_count: u32,
    pub threads_per_group: u32,

    /// Advisory sizing only. Full coverage of the problem comes from the
    /// kernel's strided loop, not from this being exact.
    pub elems_per_group: u32,
}

impl LaunchShape {
    /// Geometry for `n` elements with the default dispatch constraints.
    pub fn for_size(n: usize) -> Self {
        splay(n, MIN_GROUP_THREADS, MAX_GROUP_THREADS, MAX_GROUPS)
    }

    pub fn total_threads(&self) -> u32 {
        self.group_count * self.threads_per_group
    }
}

/// Distribute `n` independent elements over at most `max_groups` workgroups
/// of between `min_threads` and `max_threads` threads each.
///
/// `threads_per_group` is always a multiple of `min_threads`. Requires
/// `min_threads >= 1`, `max_threads >= min_threads`, `max_groups >= 1`;
/// holds for any `n`, including zero.
pub fn splay(n: usize, min_threads: usize, max_threads: usize, max_groups: usize) -> LaunchShape {
    debug_assert!(min_threads >= 1);
    debug_assert!(max_threads >= min_threads);
    debug_assert!(max_groups >= 1);

    let (group_count, threads_per_group, elems_per_group) = if n < min_threads {
        // too small to spread over groups; a single group absorbs it
        (1, min_threads, n)
    }
    else if n < max_groups * min_threads {
        // enough minimum-width groups to cover n one-to-one
        (n.div_ceil(min_threads), min_threads, min_threads)
    }
    else if n < max_groups * max_threads {
        // saturate the grid, widen groups in multiples of min_threads
        let chunks = n.div_ceil(min_threads);
        let threads = chunks.div_ceil(max_groups) * min_threads;
        (max_groups, threads, threads)
    }
    else {
        // both dimensions saturated; each thread strides over several elements
        let chunks = n.div_ceil(min_threads).div_ceil(max_groups);
        (max_groups, max_threads, chunks * min_threads)
    };

    LaunchShape {
        group_count: group_count.try_into().expect("group count overflows u32"),
        threads_per_group: threads_per_group
            .try_into()
            .expect("threads per group overflows u32"),
        elems_per_group: elems_per_group
            .try_into()
            .expect("elems per group overflows u32"),
    }
}
