use console::style;
use similar::{DiffTag, TextDiff};

const CONTEXT_LINES: usize = 2;

/// Renders a colored line diff of `old` against `new`, grouped into hunks
/// with two lines of context. Hunks are separated by `...`.
pub fn render_diff(old: &str, new: &str) -> String {
    if old == new {
        return "No changes detected.".to_string();
    }

    let diff = TextDiff::from_lines(old, new);
    let old_lines: Vec<&str> = diff.old_slices().to_vec();
    let new_lines: Vec<&str> = diff.new_slices().to_vec();
    let line = |text: &str| text.trim_end_matches(['\r', '\n']).to_string();

    let mut diff_lines = Vec::new();
    for (hunk_idx, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        if hunk_idx > 0 {
            diff_lines.push("...".to_string());
        }

        for op in group {
            let (tag, old_range, new_range) = (op.tag(), op.old_range(), op.new_range());
            match tag {
                DiffTag::Equal => {
                    for i in new_range {
                        diff_lines.push(format!("  {}", line(new_lines[i])));
                    }
                }
                DiffTag::Delete => {
                    for i in old_range {
                        diff_lines.push(style(format!("- {}", line(old_lines[i]))).red().to_string());
                    }
                }
                DiffTag::Insert => {
                    for i in new_range {
                        diff_lines.push(style(format!("+ {}", line(new_lines[i]))).green().to_string());
                    }
                }
                DiffTag::Replace => {
                    for i in old_range {
                        diff_lines.push(style(format!("- {}", line(old_lines[i]))).red().to_string());
                    }
                    for i in new_range {
                        diff_lines.push(style(format!("+ {}", line(new_lines[i]))).green().to_string());
                    }
                }
            }
        }
    }
    diff_lines.join("\n")
}
