//! Command shortcuts typed into the terminal ("bal", "tx 20", ...) and their expansion
//! into full instructions for the agent.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// One entry of the static shortcut table.
#[derive(Debug, Clone, Copy)]
pub struct ShortcutRule {
    /// Key-chord labels shown in the help listing. Never matched against input.
    pub keys: &'static [&'static str],
    pub canonical_instruction: &'static str,
    /// Lower-case ASCII tokens, unique across the whole table.
    pub aliases: &'static [&'static str],
}

pub static SHORTCUT_RULES: &[ShortcutRule] = &[
    ShortcutRule {
        keys: &["Ctrl", "B"],
        canonical_instruction: "Check my wallet balance",
        aliases: &["bal", "balance"],
    },
    ShortcutRule {
        keys: &["Ctrl", "A"],
        canonical_instruction: "What is my wallet address?",
        aliases: &["addr", "address", "whoami"],
    },
    ShortcutRule {
        keys: &["Ctrl", "N"],
        canonical_instruction: "Which network is my wallet connected to?",
        aliases: &["net", "network"],
    },
    ShortcutRule {
        keys: &["Ctrl", "T"],
        canonical_instruction: "Send",
        aliases: &["tx", "transfer"],
    },
    ShortcutRule {
        keys: &["Ctrl", "S"],
        canonical_instruction: "Swap",
        aliases: &["sw", "swap"],
    },
    ShortcutRule {
        keys: &["Ctrl", "F"],
        canonical_instruction: "Request test funds from the faucet",
        aliases: &["faucet", "fund"],
    },
    ShortcutRule {
        keys: &["Ctrl", "G"],
        canonical_instruction: "What is the current gas price on my network?",
        aliases: &["gas"],
    },
    ShortcutRule {
        keys: &["Ctrl", "K"],
        canonical_instruction: "List the token balances held by my wallet",
        aliases: &["tokens", "tok"],
    },
    ShortcutRule {
        keys: &["Ctrl", "H"],
        canonical_instruction: "List the wallet actions you can perform for me",
        aliases: &["help", "?"],
    },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutTableError {
    #[error("alias '{alias}' is declared by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("shortcut '{0}' has an empty alias")]
    EmptyAlias(String),

    #[error("alias '{0}' must be lower-case ASCII without whitespace")]
    MalformedAlias(String),

    #[error("shortcut with aliases {0:?} has an empty instruction")]
    EmptyInstruction(Vec<String>),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShortcutDescription {
    pub keys: Vec<String>,
    pub aliases: Vec<String>,
    pub description: String,
}

/// Read-only view over a shortcut table.
#[derive(Debug, Clone, Copy)]
pub struct ShortcutTable {
    rules: &'static [ShortcutRule],
}

impl Default for ShortcutTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ShortcutTable {
    pub fn builtin() -> Self {
        Self::new(SHORTCUT_RULES)
    }

    pub fn new(rules: &'static [ShortcutRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [ShortcutRule] {
        self.rules
    }

    /// Start-up check for the table invariants. Run once before serving requests.
    pub fn validate(&self) -> Result<(), ShortcutTableError> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for rule in self.rules {
            if rule.canonical_instruction.trim().is_empty() {
                return Err(ShortcutTableError::EmptyInstruction(
                    rule.aliases.iter().map(|a| a.to_string()).collect(),
                ));
            }
            for alias in rule.aliases {
                if alias.is_empty() {
                    return Err(ShortcutTableError::EmptyAlias(
                        rule.canonical_instruction.to_string(),
                    ));
                }
                let well_formed = alias
                    .chars()
                    .all(|c| c.is_ascii() && !c.is_ascii_whitespace() && !c.is_ascii_uppercase());
                if !well_formed {
                    return Err(ShortcutTableError::MalformedAlias(alias.to_string()));
                }
                if let Some(first) = owners.insert(*alias, rule.canonical_instruction) {
                    return Err(ShortcutTableError::DuplicateAlias {
                        alias: alias.to_string(),
                        first: first.to_string(),
                        second: rule.canonical_instruction.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Expands a shortcut into its instruction.
    ///
    /// Matching ignores surrounding whitespace and ASCII case. Input equal to an alias yields
    /// the instruction; input starting with an alias and a space yields the instruction
    /// followed by the remaining arguments in their original case. Rules are tried in
    /// declaration order and the first match wins. Anything else is returned untouched.
    pub fn resolve(&self, input: &str) -> String {
        let trimmed = input.trim();
        for rule in self.rules {
            for alias in rule.aliases {
                match match_alias(trimmed, alias) {
                    Some(None) => return rule.canonical_instruction.to_string(),
                    Some(Some(args)) => {
                        return format!("{} {}", rule.canonical_instruction, args)
                    }
                    None => {}
                }
            }
        }
        input.to_string()
    }

    pub fn describe_all(&self) -> Vec<ShortcutDescription> {
        self.rules
            .iter()
            .map(|rule| ShortcutDescription {
                keys: rule.keys.iter().map(|k| k.to_string()).collect(),
                aliases: rule.aliases.iter().map(|a| a.to_string()).collect(),
                description: rule.canonical_instruction.to_string(),
            })
            .collect()
    }
}

// Outer None: no match. Inner None: exact match without arguments.
fn match_alias<'a>(input: &'a str, alias: &str) -> Option<Option<&'a str>> {
    if input.eq_ignore_ascii_case(alias) {
        return Some(None);
    }
    let head = input.get(..alias.len())?;
    if !head.eq_ignore_ascii_case(alias) {
        return None;
    }
    let rest = input[alias.len()..].strip_prefix(' ')?;
    let args = rest.trim();
    if args.is_empty() {
        Some(None)
    } else {
        Some(Some(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(input: &str) -> String {
        ShortcutTable::builtin().resolve(input)
    }

    fn describe_all() -> Vec<ShortcutDescription> {
        ShortcutTable::builtin().describe_all()
    }

    #[test]
    fn builtin_table_is_valid() {
        // Memastikan tabel bawaan tidak punya alias ganda
        assert_eq!(ShortcutTable::builtin().validate(), Ok(()));
    }

    #[test]
    fn every_alias_resolves_to_its_instruction() {
        for rule in SHORTCUT_RULES {
            for alias in rule.aliases {
                assert_eq!(resolve(alias), rule.canonical_instruction);
                assert_eq!(
                    resolve(&format!("{} X", alias)),
                    format!("{} X", rule.canonical_instruction)
                );
            }
        }
    }

    #[test]
    fn matching_ignores_case_and_surrounding_whitespace() {
        assert_eq!(resolve("  BAL  "), "Check my wallet balance");
        assert_eq!(resolve("Tx 20"), "Send 20");
    }

    #[test]
    fn arguments_keep_original_case() {
        assert_eq!(resolve("SWAP ETH for USDC"), "Swap ETH for USDC");
        assert_eq!(
            resolve("tx 0.1 eth to 0xAbCd000000000000000000000000000000000001"),
            "Send 0.1 eth to 0xAbCd000000000000000000000000000000000001"
        );
    }

    #[test]
    fn unknown_input_is_returned_untouched() {
        let input = "  What's the Weather? ";
        assert_eq!(resolve(input), input);
        assert_eq!(resolve(&resolve(input)), resolve(input));
    }

    #[test]
    fn alias_prefix_without_space_does_not_match() {
        assert_eq!(resolve("balloon"), "balloon");
        assert_eq!(resolve("txt"), "txt");
    }

    #[test]
    fn alias_followed_by_blank_arguments_is_exact_match() {
        assert_eq!(resolve("bal   "), "Check my wallet balance");
    }

    #[test]
    fn non_ascii_input_does_not_panic() {
        assert_eq!(resolve("ñandú"), "ñandú");
        assert_eq!(resolve("t€"), "t€");
    }

    #[test]
    fn first_declared_rule_wins() {
        static RULES: &[ShortcutRule] = &[
            ShortcutRule {
                keys: &[],
                canonical_instruction: "first",
                aliases: &["go"],
            },
            ShortcutRule {
                keys: &[],
                canonical_instruction: "second",
                aliases: &["go"],
            },
        ];
        let table = ShortcutTable::new(RULES);
        assert_eq!(table.resolve("go"), "first");
        assert!(matches!(
            table.validate(),
            Err(ShortcutTableError::DuplicateAlias { .. })
        ));
    }

    #[test]
    fn validate_rejects_malformed_alias() {
        static RULES: &[ShortcutRule] = &[ShortcutRule {
            keys: &[],
            canonical_instruction: "x",
            aliases: &["Two Words"],
        }];
        assert_eq!(
            ShortcutTable::new(RULES).validate(),
            Err(ShortcutTableError::MalformedAlias("Two Words".to_string()))
        );
    }

    #[test]
    fn validate_rejects_empty_alias() {
        static RULES: &[ShortcutRule] = &[ShortcutRule {
            keys: &[],
            canonical_instruction: "x",
            aliases: &[""],
        }];
        assert_eq!(
            ShortcutTable::new(RULES).validate(),
            Err(ShortcutTableError::EmptyAlias("x".to_string()))
        );
    }

    #[test]
    fn describe_all_projects_table_in_order() {
        let listing = describe_all();
        assert_eq!(listing.len(), SHORTCUT_RULES.len());
        assert_eq!(listing[0].keys, vec!["Ctrl", "B"]);
        assert_eq!(listing[0].aliases, vec!["bal", "balance"]);
        assert_eq!(listing[0].description, "Check my wallet balance");
    }
}
