//! Labels and composite indices.
//!
//! Domain points are addressed by position (`Label::Pos`), set members such as
//! phases and components by name (`Label::Name`).

use core::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Pos(usize),
    Name(Arc<str>),
}

impl Label {
    pub fn as_pos(&self) -> Option<usize> {
        match self {
            Label::Pos(p) => Some(*p),
            Label::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Label::Pos(_) => None,
            Label::Name(n) => Some(n),
        }
    }
}

impl From<usize> for Label {
    fn from(v: usize) -> Self {
        Label::Pos(v)
    }
}

impl From<&str> for Label {
    fn from(v: &str) -> Self {
        Label::Name(Arc::from(v))
    }
}

impl From<&String> for Label {
    fn from(v: &String) -> Self {
        Label::Name(Arc::from(v.as_str()))
    }
}

impl From<String> for Label {
    fn from(v: String) -> Self {
        Label::Name(Arc::from(v))
    }
}

impl From<Arc<str>> for Label {
    fn from(v: Arc<str>) -> Self {
        Label::Name(v)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Pos(p) => write!(f, "{p}"),
            Label::Name(n) => write!(f, "{n}"),
        }
    }
}

/// Ordered tuple of labels. The empty index addresses a scalar component.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Index(pub Vec<Label>);

impl Index {
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    /// Append a label, builder style.
    pub fn with(mut self, label: impl Into<Label>) -> Self {
        self.0.push(label.into());
        self
    }

    /// Concatenate two indices.
    pub fn join(&self, tail: &Index) -> Self {
        let mut labels = self.0.clone();
        labels.extend(tail.0.iter().cloned());
        Self(labels)
    }

    pub fn labels(&self) -> &[Label] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Label> {
        self.0.get(i)
    }

    pub fn pos(&self, i: usize) -> Option<usize> {
        self.0.get(i).and_then(Label::as_pos)
    }

    pub fn name(&self, i: usize) -> Option<&str> {
        self.0.get(i).and_then(Label::as_name)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, "[")?;
        for (i, l) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{l}")?;
        }
        write!(f, "]")
    }
}

/// Build an [`Index`] from labels: `idx![t, x, "Liq", "c1"]`.
#[macro_export]
macro_rules! idx {
    () => { $crate::index::Index::scalar() };
    ($($l:expr),+ $(,)?) => {
        $crate::index::Index(vec![$($crate::index::Label::from($l)),+])
    };
}
