//! Profile-derived tuning hints handed to downstream transforms.

use pathwise_ir::{Function, NodeIndex, ProfileInfo};

/// Unroll factor suggested for a loop: the execution count of its hottest
/// block, rounded to the nearest whole iteration. Unprofiled loops read
/// as zero, which unrollers treat as no hint.
pub fn unroll_count(profile: &ProfileInfo, loop_blocks: &[NodeIndex]) -> u32 {
    let hottest = loop_blocks
        .iter()
        .filter_map(|block| profile.execution_count(*block))
        .fold(0.0f64, f64::max);
    (hottest + 0.5) as u32
}

/// Entry execution count, when the profiler recorded one. Callers rank
/// functions by it to decide which deserve the heavier passes.
pub fn entry_hotness(func: &Function, profile: &ProfileInfo) -> Option<f64> {
    profile.execution_count(func.entry())
}

#[cfg(test)]
mod test {
    use pathwise_ir::{FunctionBuilder, Type};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unroll_hint_rounds_the_hottest_block() {
        let blocks = [NodeIndex::new(0), NodeIndex::new(1), NodeIndex::new(2)];
        let mut profile = ProfileInfo::new();
        profile.set_block_count(blocks[0], 2.4);
        profile.set_block_count(blocks[1], 7.6);

        assert_eq!(unroll_count(&profile, &blocks), 8);
        assert_eq!(unroll_count(&ProfileInfo::new(), &blocks), 0);
    }

    #[test]
    fn entry_hotness_reads_the_entry_count() {
        let mut builder = FunctionBuilder::new("hot", &[Type::I32]);
        builder.ret(None);
        let func = builder.finish();

        let mut profile = ProfileInfo::new();
        assert_eq!(entry_hotness(&func, &profile), None);
        profile.set_block_count(func.entry(), 42.0);
        assert_eq!(entry_hotness(&func, &profile), Some(42.0));
    }
}
