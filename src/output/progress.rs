use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{done, failure, pending};

/// "Acknowledged, working" indicator shown while pipelines run.
///
/// Only marks start and end of the whole batch; stages are not reported.
pub struct Acknowledgement {
    pb: ProgressBar,
}

impl Acknowledgement {
    pub fn start(repositories: usize) -> Self {
        let noun = if repositories == 1 { "repository" } else { "repositories" };
        let pb = create_spinner(
            pending(format!("Counting lines for {repositories} {noun}")).to_string(),
        );
        Self { pb }
    }

    /// Leaves the spinner line in place with an interruption notice.
    pub fn interrupted(self) {
        self.pb
            .abandon_with_message(failure("Interrupted, in-flight clones removed").to_string());
    }

    pub fn finish(self, succeeded: usize, total: usize) {
        self.pb.finish_with_message(
            done(format!("Counted {succeeded}/{total} ✓")).to_string(),
        );
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_spinner().template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
