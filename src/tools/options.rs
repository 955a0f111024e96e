// ============================================================================
// TOOL OPTIONS - named, typed per-tool settings with change notification
// ============================================================================

use std::fmt;

use crate::error::{PaintError, Result};
use crate::observer::{Subscribers, SubscriptionId};

#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Number(f32),
    Text(String),
    Flag(bool),
    /// One of a fixed set of names.
    Choice(String),
}

impl OptionValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Number(_) => "number",
            OptionValue::Text(_) => "string",
            OptionValue::Flag(_) => "boolean",
            OptionValue::Choice(_) => "choice",
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            OptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            OptionValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(s) | OptionValue::Choice(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Text(s) | OptionValue::Choice(s) => f.write_str(s),
            OptionValue::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// Payload delivered to option subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionChange {
    pub name: String,
    pub value: OptionValue,
}

#[derive(Clone, Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub value: OptionValue,
    /// Allowed names for `Choice` options.
    pub choices: &'static [&'static str],
    /// Inclusive clamp for `Number` options.
    pub range: Option<(f32, f32)>,
}

impl OptionSpec {
    pub fn number(name: &'static str, value: f32, min: f32, max: f32) -> Self {
        Self {
            name,
            value: OptionValue::Number(value),
            choices: &[],
            range: Some((min, max)),
        }
    }

    pub fn flag(name: &'static str, value: bool) -> Self {
        Self {
            name,
            value: OptionValue::Flag(value),
            choices: &[],
            range: None,
        }
    }

    pub fn choice(name: &'static str, value: &'static str, choices: &'static [&'static str]) -> Self {
        Self {
            name,
            value: OptionValue::Choice(value.to_string()),
            choices,
            range: None,
        }
    }

    pub fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            value: OptionValue::Text(value.to_string()),
            choices: &[],
            range: None,
        }
    }
}

/// The option set owned by one tool.
pub struct ToolOptions {
    owner: String,
    entries: Vec<OptionSpec>,
    subscribers: Subscribers<OptionChange>,
}

impl ToolOptions {
    pub fn new(owner: impl Into<String>, entries: Vec<OptionSpec>) -> Self {
        Self {
            owner: owner.into(),
            entries,
            subscribers: Subscribers::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    pub fn specs(&self) -> &[OptionSpec] {
        &self.entries
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&OptionValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
            .ok_or_else(|| self.unknown(name))
    }

    /// Set a value of the declared type and notify subscribers.  Numbers are
    /// clamped to their range; a `Text` value is accepted for a `Choice`
    /// option when it names one of the choices.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<()> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) else {
            return Err(self.unknown(name));
        };
        let mismatch = |expected: &'static str| PaintError::OptionType {
            option: name.to_string(),
            expected,
        };
        let value = match (&entry.value, value) {
            (OptionValue::Number(_), OptionValue::Number(n)) => {
                if !n.is_finite() {
                    return Err(mismatch("finite number"));
                }
                let n = match entry.range {
                    Some((lo, hi)) => n.clamp(lo, hi),
                    None => n,
                };
                OptionValue::Number(n)
            }
            (OptionValue::Flag(_), OptionValue::Flag(b)) => OptionValue::Flag(b),
            (OptionValue::Text(_), OptionValue::Text(s)) => OptionValue::Text(s),
            (OptionValue::Choice(_), OptionValue::Choice(s) | OptionValue::Text(s)) => {
                if !entry.choices.contains(&s.as_str()) {
                    return Err(mismatch("one of the listed choices"));
                }
                OptionValue::Choice(s)
            }
            (current, _) => return Err(mismatch(current.type_name())),
        };
        entry.value = value.clone();
        self.subscribers.notify(&OptionChange {
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    pub fn number_or(&self, name: &str, fallback: f32) -> f32 {
        self.get(name).ok().and_then(OptionValue::as_number).unwrap_or(fallback)
    }

    pub fn flag_or(&self, name: &str, fallback: bool) -> bool {
        self.get(name).ok().and_then(OptionValue::as_flag).unwrap_or(fallback)
    }

    pub fn str_or<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.get(name).ok().and_then(OptionValue::as_str).unwrap_or(fallback)
    }

    pub fn subscribe(&self, handler: impl Fn(&OptionChange) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn unknown(&self, name: &str) -> PaintError {
        PaintError::UnknownOption {
            tool: self.owner.clone(),
            option: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shape_options() -> ToolOptions {
        ToolOptions::new(
            "shape",
            vec![
                OptionSpec::choice("shape", "rectangle", &["rectangle", "ellipse"]),
                OptionSpec::flag("outlined", false),
                OptionSpec::number("thickness", 4.0, 1.0, 100.0),
            ],
        )
    }

    #[test]
    fn set_validates_type_and_notifies() {
        let mut opts = shape_options();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        opts.subscribe(move |c| sink.borrow_mut().push(c.name.clone()));

        assert!(opts.set("outlined", OptionValue::Flag(true)).is_ok());
        assert!(matches!(
            opts.set("outlined", OptionValue::Number(1.0)),
            Err(PaintError::OptionType { expected: "boolean", .. })
        ));
        assert!(opts.set("shape", OptionValue::Text("ellipse".into())).is_ok());
        assert!(opts.set("shape", OptionValue::Text("hexagon".into())).is_err());
        assert_eq!(opts.str_or("shape", ""), "ellipse");
        assert_eq!(*seen.borrow(), vec!["outlined".to_string(), "shape".to_string()]);
    }

    #[test]
    fn unknown_option_names_its_tool() {
        let mut opts = shape_options();
        match opts.set("radius", OptionValue::Number(2.0)) {
            Err(PaintError::UnknownOption { tool, option }) => {
                assert_eq!((tool.as_str(), option.as_str()), ("shape", "radius"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(opts.get("radius").is_err());
    }

    #[test]
    fn numbers_clamp_to_range() {
        let mut opts = shape_options();
        assert!(opts.set("thickness", OptionValue::Number(500.0)).is_ok());
        assert_eq!(opts.number_or("thickness", 0.0), 100.0);
        assert!(opts.set("thickness", OptionValue::Number(f32::NAN)).is_err());
    }

    #[test]
    fn text_options_take_only_text() {
        let mut opts = ToolOptions::new("stamp", vec![OptionSpec::text("label", "A")]);
        assert_eq!(opts.get("label").ok(), Some(&OptionValue::Text("A".into())));
        assert!(opts.set("label", OptionValue::Text("hello".into())).is_ok());
        assert!(matches!(
            opts.set("label", OptionValue::Flag(true)),
            Err(PaintError::OptionType { expected: "string", .. })
        ));
        assert_eq!(opts.str_or("label", ""), "hello");
    }
}
