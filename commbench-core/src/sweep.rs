// SPDX-License-Identifier: Apache-2.0

//! Sweep enumeration.
//!
//! Produces the lazy cross-product of the configured axes, filtered by a
//! validity predicate. Enumeration order is deterministic: axis declaration
//! order (strategy, size, process count, thread count), then value order
//! within each axis, so identical axis definitions reproduce identical
//! output ordering across runs.

/// Ordered candidate values for every sweep axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepAxes {
    /// Communication strategy tokens passed verbatim to the target.
    pub comm_strategies: Vec<String>,
    /// Problem sizes (matrix dimension).
    pub matrix_sizes: Vec<u64>,
    /// MPI process counts.
    pub process_counts: Vec<u32>,
    /// Thread counts exported to the target's parallel runtime.
    pub thread_counts: Vec<u32>,
}

impl SweepAxes {
    /// Axis names and value lists in declaration order, for the startup log.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("comm_strategies", format!("{:?}", self.comm_strategies)),
            ("matrix_sizes", format!("{:?}", self.matrix_sizes)),
            ("process_counts", format!("{:?}", self.process_counts)),
            ("thread_counts", format!("{:?}", self.thread_counts)),
        ]
    }

    /// Size of the unfiltered cross-product.
    pub fn cross_product_size(&self) -> usize {
        self.comm_strategies.len()
            * self.matrix_sizes.len()
            * self.process_counts.len()
            * self.thread_counts.len()
    }
}

/// One concrete assignment of a value to every axis. Immutable once
/// generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub comm_strategy: String,
    pub matrix_size: u64,
    pub num_procs: u32,
    pub num_threads: u32,
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} n={} p={} t={}",
            self.comm_strategy, self.matrix_size, self.num_procs, self.num_threads
        )
    }
}

/// Default validity predicate: the problem must decompose evenly across
/// the processes.
pub fn is_valid(config: &Configuration) -> bool {
    config.matrix_size % config.num_procs as u64 == 0
}

/// Lazy cross-product of the axes filtered by the default predicate.
pub fn configurations(axes: &SweepAxes) -> impl Iterator<Item = Configuration> + '_ {
    configurations_with(axes, is_valid)
}

/// Lazy cross-product filtered by an arbitrary predicate. Invalid
/// combinations are skipped silently; they are not failures.
pub fn configurations_with<P>(
    axes: &SweepAxes,
    predicate: P,
) -> impl Iterator<Item = Configuration> + '_
where
    P: Fn(&Configuration) -> bool + 'static,
{
    axes.comm_strategies
        .iter()
        .flat_map(move |strategy| {
            axes.matrix_sizes.iter().flat_map(move |&size| {
                axes.process_counts.iter().flat_map(move |&procs| {
                    axes.thread_counts.iter().map(move |&threads| Configuration {
                        comm_strategy: strategy.clone(),
                        matrix_size: size,
                        num_procs: procs,
                        num_threads: threads,
                    })
                })
            })
        })
        .filter(move |config| predicate(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(sizes: &[u64], procs: &[u32]) -> SweepAxes {
        SweepAxes {
            comm_strategies: vec!["collective".to_string()],
            matrix_sizes: sizes.to_vec(),
            process_counts: procs.to_vec(),
            thread_counts: vec![1],
        }
    }

    #[test]
    fn test_divisibility_filter() {
        let axes = axes(&[4, 8], &[2, 3]);
        let configs: Vec<(u64, u32)> = configurations(&axes)
            .map(|c| (c.matrix_size, c.num_procs))
            .collect();
        // 4%3 and 8%3 are rejected; declaration order is preserved.
        assert_eq!(configs, vec![(4, 2), (8, 2)]);
    }

    #[test]
    fn test_full_cross_product_order() {
        let axes = SweepAxes {
            comm_strategies: vec!["sync".to_string(), "async".to_string()],
            matrix_sizes: vec![2, 4],
            process_counts: vec![1, 2],
            thread_counts: vec![1],
        };
        let configs: Vec<Configuration> = configurations(&axes).collect();
        assert_eq!(configs.len(), 8);
        // Strategy varies slowest, process count fastest (threads constant).
        assert_eq!(configs[0].comm_strategy, "sync");
        assert_eq!(configs[0].matrix_size, 2);
        assert_eq!(configs[0].num_procs, 1);
        assert_eq!(configs[1].num_procs, 2);
        assert_eq!(configs[4].comm_strategy, "async");
    }

    #[test]
    fn test_custom_predicate() {
        let axes = axes(&[4, 8, 16], &[2]);
        let configs: Vec<u64> = configurations_with(&axes, |c| c.matrix_size > 4)
            .map(|c| c.matrix_size)
            .collect();
        assert_eq!(configs, vec![8, 16]);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let axes = axes(&[], &[2]);
        assert_eq!(configurations(&axes).count(), 0);
    }

    #[test]
    fn test_cross_product_size() {
        let axes = SweepAxes {
            comm_strategies: vec!["a".into(), "b".into()],
            matrix_sizes: vec![1, 2, 3],
            process_counts: vec![1],
            thread_counts: vec![1, 2],
        };
        assert_eq!(axes.cross_product_size(), 12);
    }
}
