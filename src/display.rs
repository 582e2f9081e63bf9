use spinoff::{Color, Spinner, spinners};
use std::io::IsTerminal;

/// Owns the spinner while reports are fetched, if there is one.
pub struct SpinnerContainer {
    instance: Option<Spinner>,
}

impl SpinnerContainer {
    // spinoff has no idle spinner, so an empty container stands in for it.
    // Commands that never touch the network (query build/parse) just leave it empty
    // and the result goes through println! instead.
    pub fn new() -> Self {
        SpinnerContainer { instance: None }
    }

    /// Starts spinning unless animations are off or stdout isn't a terminal,
    /// so pipes and status bars never see the frames.
    // Note: the condition is spelled out in the name on purpose, I kept forgetting
    // that a piped run gets no spinner at all.
    pub fn start_unless_no_terminal_or(&mut self, no_animate: bool, message: &str) {
        if no_animate || !std::io::stdout().is_terminal() || self.instance.is_some() {
            return;
        }

        self.instance = Some(Spinner::new(spinners::Dots, message.to_owned(), Color::Blue));
    }

    pub fn update_text(&mut self, message: String) {
        if let Some(spinner) = self.instance.as_mut() {
            spinner.update_text(message)
        }
    }

    /// Prints the result, replacing the spinner when one is running.
    pub fn stop_with_message(&mut self, message: &str) {
        // take() so Drop doesn't stop it a second time.
        match self.instance.take() {
            Some(mut s) => s.stop_with_message(message),
            None => println!("{}", message),
        }
    }
}

impl Default for SpinnerContainer {
    fn default() -> Self {
        SpinnerContainer::new()
    }
}

impl Drop for SpinnerContainer {
    fn drop(&mut self) {
        if let Some(s) = self.instance.as_mut() {
            // clear() leaves the line behind, I didn't dig into why.
            // An empty stop message gives the same result, so we live with it.
            s.stop_with_message("");
        }
    }
}
