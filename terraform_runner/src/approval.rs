use std::io::{self, BufRead, BufReader, Write};
use std::sync::Mutex;

/// Human approval step. Receives the text to review (the plan, or a destroy
/// warning) and blocks until a decision is made.
pub trait ApprovalGate: Send + Sync {
    fn approve(&self, plan_text: &str) -> bool;
}

impl<F> ApprovalGate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn approve(&self, plan_text: &str) -> bool {
        self(plan_text)
    }
}

/// Console approval: shows the text and asks until `yes` or `no` is typed.
/// End of input counts as `no`.
pub struct PromptApproval<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
}

impl PromptApproval<BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        PromptApproval::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> PromptApproval<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    pub fn new(input: R, output: W) -> Self {
        PromptApproval {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    pub fn into_output(self) -> Option<W> {
        self.output.into_inner().ok()
    }
}

impl<R, W> ApprovalGate for PromptApproval<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn approve(&self, plan_text: &str) -> bool {
        let (Ok(mut input), Ok(mut output)) = (self.input.lock(), self.output.lock()) else {
            return false;
        };

        let ruler = "=".repeat(80);
        let _ = writeln!(output, "\n{}\n{}\n{}", ruler, plan_text.trim_end(), ruler);

        loop {
            let _ = write!(output, "Type 'yes' to proceed, 'no' to cancel: ");
            let _ = output.flush();

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => return false,
                Ok(_) => {}
            }

            match line.trim().to_lowercase().as_str() {
                "yes" => return true,
                "no" => return false,
                _ => {
                    let _ = writeln!(output, "Please type 'yes' or 'no'");
                }
            }
        }
    }
}
