use std::fmt;

/// A header that can be listed field by field in a [`Trace`].
pub trait Describe {
    /// Name of the structure as printed in the dump.
    const NAME: &'static str;

    fn fields(&self) -> Vec<(&'static str, String)>;
}

/// One parsed header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderRecord {
    pub name: &'static str,
    /// Absolute offset of the header in the input.
    pub offset: usize,
    pub fields: Vec<(&'static str, String)>,
}

impl HeaderRecord {
    /// Returns the rendered value of `field`, if present.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value.as_str())
    }
}

/// Every header parsed during one decode, in parse order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    records: Vec<HeaderRecord>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<H: Describe>(&mut self, offset: usize, header: &H) {
        log::debug!("{} at {offset:#x}", H::NAME);
        self.records.push(HeaderRecord {
            name: H::NAME,
            offset,
            fields: header.fields(),
        });
    }

    pub fn records(&self) -> &[HeaderRecord] {
        &self.records
    }

    /// Iterates over the records named `name`.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderRecord> + 'a {
        self.records.iter().filter(move |record| record.name == name)
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{}:", record.name)?;
            for (name, value) in &record.fields {
                writeln!(f, "  {:<24}{value}", format!("{name}:"))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
