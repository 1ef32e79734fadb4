/// Trailer clang-tidy prints per translation unit, even when every warning was
/// suppressed by configuration.
pub const WARNINGS_GENERATED: &str = "warnings generated.";

/// Drops `N warnings generated.` lines, keeping all other lines untouched and in order.
pub fn filter_output(output: &str) -> String {
    output
        .split_inclusive('\n')
        .filter(|line| {
            !line
                .trim_end_matches(['\n', '\r'])
                .ends_with(WARNINGS_GENERATED)
        })
        .collect()
}
