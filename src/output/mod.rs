mod progress;
mod styling;
mod tables;

pub use progress::Acknowledgement;
pub use styling::failure;
use styling::{muted, title};
pub use tables::render_report;

/// Prints the clocbot banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        title("🧮 clocbot"),
        muted(env!("CARGO_PKG_VERSION")),
        muted("Lines of code for any git repository")
    );
}
