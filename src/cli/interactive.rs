// Interactive render mode selection over stdin.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::render::{RenderChoiceState, RenderDecision, RenderMode, RenderModePolicy};

/// Asks the user which render mode to try next. End of input means exit.
pub struct InteractivePolicy<R> {
    input: R,
}

impl InteractivePolicy<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> InteractivePolicy<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    async fn read_answer(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line).await {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_ascii_lowercase()),
        }
    }
}

pub fn parse_answer(answer: &str) -> Option<RenderDecision> {
    match answer {
        "t" | "template" => Some(RenderDecision::Render(RenderMode::Template)),
        "a" | "ai" | "ai-code" | "ai_code" | "code" => Some(RenderDecision::Render(RenderMode::AiCode)),
        "x" | "q" | "exit" | "quit" => Some(RenderDecision::Exit),
        _ => None,
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> RenderModePolicy for InteractivePolicy<R> {
    async fn choose(&mut self, state: &RenderChoiceState) -> RenderDecision {
        if let Some(failure) = state.last_failure() {
            eprintln!();
            eprintln!("❌ The {} render failed:", failure.mode);
            eprintln!("   {}", failure.reason);
        }

        loop {
            eprint!("🎬 Render with [t]emplate, [a]i-code, or e[x]it? ");
            let Some(answer) = self.read_answer().await else {
                eprintln!();
                return RenderDecision::Exit;
            };
            match parse_answer(&answer) {
                Some(decision) => return decision,
                None => eprintln!("   Unrecognized choice '{answer}'"),
            }
        }
    }
}
