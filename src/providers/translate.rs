// Message translation policies
//
// Backends disagree on where system prompts live. Each adapter declares one
// policy as a constant and runs its messages through `translate` before
// building backend parameters.

use super::types::{Message, Role};
use crate::errors::{GatewayError, Result};

/// Separator placed between consecutive system messages when they are hoisted
pub const SYSTEM_SEPARATOR: &str = "\n\n";

/// How a backend expects system messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPolicy {
    /// System content travels as a separate parameter, not in the message array
    AsParameter,
    /// System messages stay in the message array where they appear
    Inline,
}

/// Messages ready for a backend call
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    /// Hoisted system content (only ever set under `SystemPolicy::AsParameter`)
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

/// Translate canonical messages according to `policy`
pub fn translate(policy: SystemPolicy, messages: &[Message]) -> Result<Translated> {
    match policy {
        SystemPolicy::AsParameter => extract_system(messages),
        SystemPolicy::Inline => Ok(Translated {
            system: None,
            messages: messages.to_vec(),
        }),
    }
}

fn extract_system(messages: &[Message]) -> Result<Translated> {
    let (system, rest): (Vec<&Message>, Vec<&Message>) =
        messages.iter().partition(|m| m.role == Role::System);

    if rest.is_empty() {
        return Err(GatewayError::validation(
            "At least one user or assistant message is required.",
        ));
    }

    let system = if system.is_empty() {
        None
    } else {
        Some(
            system
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join(SYSTEM_SEPARATOR),
        )
    };

    Ok(Translated {
        system,
        messages: rest.into_iter().cloned().collect(),
    })
}
