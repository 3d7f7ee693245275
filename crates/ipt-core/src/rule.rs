use crate::counters::Counters;

/// One rule line split into its counter annotation, owning chain and flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleLine {
    /// `None` when the annotation is missing or malformed
    pub counters: Option<Counters>,
    /// Value of the `-A`/`--append` directive, if any
    pub chain: Option<String>,
    /// Remaining flags with their values, in line order
    pub flags: Vec<String>,
}

impl RuleLine {
    /// Canonical rule text used as the rule's identity and metric label
    pub fn rule_text(&self) -> String {
        self.flags.join(" ")
    }
}

/// Split a rule line such as `[5:100] -A INPUT -p tcp -j ACCEPT` into its parts.
pub fn tokenize_rule(line: &str) -> RuleLine {
    let mut tokenizer = RuleTokenizer::default();
    for token in line.split_whitespace() {
        tokenizer.handle_token(token);
    }
    tokenizer.finish()
}

#[derive(Default)]
struct RuleTokenizer<'a> {
    counters: Option<Counters>,
    current: Option<&'a str>,
    values: Vec<&'a str>,
    chain: Option<&'a str>,
    flags: Vec<&'a str>,
}

impl<'a> RuleTokenizer<'a> {
    fn handle_token(&mut self, token: &'a str) {
        if token.starts_with('[') {
            // Last annotation wins, and it does not close the open flag group.
            self.counters = Counters::parse(token);
        } else if token.starts_with('-') {
            self.flush();
            self.current = Some(token);
        } else {
            self.values.push(token);
        }
    }

    fn flush(&mut self) {
        match self.current.take() {
            None => {}
            Some("-A" | "--append") => {
                if let Some(&chain) = self.values.first() {
                    self.chain = Some(chain);
                }
            }
            Some(flag) => {
                self.flags.push(flag);
                self.flags.extend_from_slice(&self.values);
            }
        }
        self.values.clear();
    }

    fn finish(mut self) -> RuleLine {
        self.flush();
        RuleLine {
            counters: self.counters,
            chain: self.chain.map(str::to_string),
            flags: self.flags.into_iter().map(str::to_string).collect(),
        }
    }
}
