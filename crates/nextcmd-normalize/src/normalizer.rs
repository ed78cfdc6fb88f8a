use crate::alias;
use crate::error::{Error, Result};
use crate::head;
use crate::slots;
use crate::tokenize::tokenize;
use nextcmd_core::content_hash;
use nextcmd_types::{NormalizedCommand, PreNorm, Slot, SlotTag};
use std::collections::HashMap;

/// Tokenizes raw commands, extracts slots, and produces a canonical
/// template id and normalized form (§4.1, C1). Pure and deterministic:
/// given the same input (and the same alias table) it always returns
/// the same output, in-process or across processes (§8 property 1).
#[derive(Debug)]
pub struct Normalizer {
    aliases: HashMap<String, String>,
    alias_max_depth: u32,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(HashMap::new(), alias::DEFAULT_MAX_DEPTH)
    }
}

impl Normalizer {
    pub fn new(aliases: HashMap<String, String>, alias_max_depth: u32) -> Self {
        Self {
            aliases,
            alias_max_depth,
        }
    }

    /// Cheap first pass (§4.1, "Pre-normalization"): alias-expand and
    /// normalize without building the full slot list.
    pub fn pre_normalize(&self, raw: &str) -> Result<PreNorm> {
        let (expanded, alias_expanded) = alias::expand(raw, &self.aliases, self.alias_max_depth);
        let (normalized_text, _slots) = self.normalize_text(&expanded)?;
        let template_id = content_hash(&normalized_text);
        Ok(PreNorm {
            normalized_text,
            template_id,
            alias_expanded,
        })
    }

    /// Full normalization (§4.1): normalized text, template id, and the
    /// recognized slots.
    pub fn normalize(&self, raw: &str) -> Result<NormalizedCommand> {
        let (expanded, _alias_expanded) = alias::expand(raw, &self.aliases, self.alias_max_depth);
        let (normalized_text, slots) = self.normalize_text(&expanded)?;
        let template_id = content_hash(&normalized_text);
        Ok(NormalizedCommand {
            normalized_text,
            template_id,
            slots,
        })
    }

    fn normalize_text(&self, text: &str) -> Result<(String, Vec<Slot>)> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(Error::EmptyCommand);
        }
        Ok(normalize_tokens(&tokens))
    }
}

/// Core token-by-token normalization shared by pre- and full
/// normalization. Position 0 (the head) is always preserved verbatim; a
/// single recognized subcommand immediately after it is preserved too.
/// Every remaining token is either a known flag (preserved verbatim), a
/// message-flag argument (`<msg>`), or classified by [`slots::classify`].
fn normalize_tokens(tokens: &[String]) -> (String, Vec<Slot>) {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    let mut slots = Vec::new();

    let head_token = &tokens[0];
    out.push(head_token.clone());
    let spec = head::lookup(head_token);

    let mut idx = 1usize;
    if let Some(spec) = spec
        && idx < tokens.len()
        && spec.subcommands.contains(&tokens[idx].as_str())
    {
        out.push(tokens[idx].clone());
        idx += 1;
    }

    let mut expect_message = false;
    while idx < tokens.len() {
        let token = &tokens[idx];

        if expect_message {
            out.push(SlotTag::Msg.placeholder().to_string());
            slots.push(Slot {
                position: idx,
                tag: SlotTag::Msg,
                raw_value: token.clone(),
            });
            expect_message = false;
            idx += 1;
            continue;
        }

        if token.starts_with('-') && token.len() > 1 {
            let is_known = spec
                .map(|s| s.known_flags.contains(&token.as_str()))
                .unwrap_or(false);
            let is_message_flag = spec
                .map(|s| s.message_flags.contains(&token.as_str()))
                .unwrap_or(false)
                || head::ALL_MESSAGE_FLAGS.contains(token.as_str());

            if is_known || is_message_flag {
                out.push(token.clone());
            } else {
                out.push(SlotTag::Arg.placeholder().to_string());
                slots.push(Slot {
                    position: idx,
                    tag: SlotTag::Arg,
                    raw_value: token.clone(),
                });
            }
            expect_message = is_message_flag;
            idx += 1;
            continue;
        }

        let tag = slots::classify(token);
        out.push(tag.placeholder().to_string());
        slots.push(Slot {
            position: idx,
            tag,
            raw_value: token.clone(),
        });
        idx += 1;
    }

    (out.join(" "), slots)
}
