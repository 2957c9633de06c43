use crate::error::FixError;
use crate::models::FixMessage;
use crate::tag::disambiguated_tag;

impl FixMessage {
    /// Insert a field, keeping every occurrence of a repeated tag.
    ///
    /// The first occurrence is stored under `tag`; later ones go to the first
    /// free name among `tag_1`, `tag_2`, ... so `638=1;638=2` becomes
    /// `638=1;638_1=2`.
    pub fn add_tag(&mut self, tag: &str, value: &str) -> &mut Self {
        let mut name = tag.to_string();
        let mut occurrence = 1;
        while self.contains_key(&name) {
            name = disambiguated_tag(tag, occurrence);
            occurrence += 1;
        }

        self.fields.push((name, value.to_string()));
        self
    }

    /// Whether `tag` is already taken, so the next insert gets a suffix
    pub(crate) fn is_repeat(&self, tag: &str) -> bool {
        self.contains_key(tag)
    }
}

/// Register `(tag, value)` into a message target that may be absent.
///
/// An absent target is a caller bug, so it is surfaced as
/// [`FixError::InvalidArgument`] instead of being ignored.
pub fn add_tag<'m>(
    message: Option<&'m mut FixMessage>,
    tag: &str,
    value: &str,
) -> Result<&'m mut FixMessage, FixError> {
    let message = message.ok_or_else(|| FixError::InvalidArgument {
        parameter: "message".to_string(),
        message: format!("cannot add tag '{}' to an absent message", tag),
    })?;

    Ok(message.add_tag(tag, value))
}
