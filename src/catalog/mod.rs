//! Text encoding of table metadata stored in page 0 of a table file.
//!
//! Layout:
//! `name|numAttr[(attrName:dataTypeCode~typeLength)...]keySize{k1:k2...}$page:slot$?total?`

use std::str::FromStr;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::record::{Attribute, DataType, RecordId, Schema};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Malformed table metadata: {0}")]
    Malformed(String),

    #[error("Table metadata does not fit in a page: {0} bytes")]
    MetadataTooLarge(usize),

    #[error("Name contains a reserved character: {0:?}")]
    InvalidName(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::MetadataTooLarge(_) => ErrorKind::ResourceExhausted,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Characters with a structural meaning in the encoded text
const RESERVED: &[char] = &['|', '[', ']', '(', ')', ':', '~', '{', '}', '$', '?', '\0'];

/// Check that a table or attribute name survives encoding
pub fn validate_name(name: &str) -> CatalogResult<()> {
    if name.is_empty() || name.contains(RESERVED) {
        return Err(CatalogError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Everything page 0 of a table file records about the table
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    pub name: String,
    pub schema: Schema,
    /// Where the next inserted record goes
    pub first_free: RecordId,
    pub total_records: usize,
}

impl TableMetadata {
    /// Metadata of a freshly created, empty table
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            first_free: RecordId::new(1, 0),
            total_records: 0,
        }
    }

    pub fn encode(&self) -> CatalogResult<String> {
        validate_name(&self.name)?;

        let mut out = format!("{}|{}[", self.name, self.schema.num_attrs());
        for attr in self.schema.attributes() {
            validate_name(&attr.name)?;
            out.push_str(&format!(
                "({}:{}~{})",
                attr.name,
                attr.data_type.code(),
                attr.data_type.type_length()
            ));
        }

        let keys: Vec<String> = self
            .schema
            .key_attrs()
            .iter()
            .map(|k| k.to_string())
            .collect();
        out.push_str(&format!("]{}{{{}}}", keys.len(), keys.join(":")));
        out.push_str(&format!(
            "${}:{}$?{}?",
            self.first_free.page_id, self.first_free.slot_id, self.total_records
        ));
        Ok(out)
    }

    pub fn decode(text: &str) -> CatalogResult<Self> {
        let mut cur = Cursor::new(text.trim_end_matches('\0'));

        let name = cur.take_until('|')?.to_string();
        validate_name(&name).map_err(|_| malformed("table name"))?;

        let num_attrs: usize = cur.number('[')?;
        let mut attributes = Vec::with_capacity(num_attrs);
        for _ in 0..num_attrs {
            cur.expect('(')?;
            let attr_name = cur.take_until(':')?.to_string();
            let code: u8 = cur.number('~')?;
            let type_length: usize = cur.number(')')?;
            let data_type = DataType::from_code(code, type_length)
                .map_err(|_| malformed(&format!("data type code {}", code)))?;
            attributes.push(Attribute::new(attr_name, data_type));
        }
        cur.expect(']')?;

        let key_size: usize = cur.number('{')?;
        let key_text = cur.take_until('}')?;
        let key_attrs = if key_text.is_empty() {
            Vec::new()
        } else {
            key_text
                .split(':')
                .map(|k| k.parse::<usize>().map_err(|_| malformed("key attribute")))
                .collect::<CatalogResult<Vec<_>>>()?
        };
        if key_attrs.len() != key_size {
            return Err(malformed("key count"));
        }

        cur.expect('$')?;
        let page_id = cur.number(':')?;
        let slot_id = cur.number('$')?;
        cur.expect('?')?;
        let total_records = cur.number('?')?;
        if !cur.rest().is_empty() {
            return Err(malformed("trailing data"));
        }

        let schema = Schema::new(attributes, key_attrs)
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;

        Ok(Self {
            name,
            schema,
            first_free: RecordId::new(page_id, slot_id),
            total_records,
        })
    }

    /// Encode into a page buffer, NUL-padding the rest of the page
    pub fn write_page(&self, page: &mut [u8]) -> CatalogResult<()> {
        let text = self.encode()?;
        // Keep at least one NUL terminator
        if text.len() >= page.len() {
            return Err(CatalogError::MetadataTooLarge(text.len()));
        }
        page.fill(0);
        page[..text.len()].copy_from_slice(text.as_bytes());
        Ok(())
    }

    pub fn read_page(page: &[u8]) -> CatalogResult<Self> {
        let end = page.iter().position(|&b| b == 0).unwrap_or(page.len());
        let text = std::str::from_utf8(&page[..end]).map_err(|_| malformed("utf-8"))?;
        Self::decode(text)
    }
}

fn malformed(what: &str) -> CatalogError {
    CatalogError::Malformed(what.to_string())
}

struct Cursor<'a> {
    text: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text }
    }

    fn rest(&self) -> &'a str {
        self.text
    }

    fn expect(&mut self, c: char) -> CatalogResult<()> {
        self.text = self
            .text
            .strip_prefix(c)
            .ok_or_else(|| malformed(&format!("expected '{}'", c)))?;
        Ok(())
    }

    /// Consume up to and including `delim`, returning the text before it
    fn take_until(&mut self, delim: char) -> CatalogResult<&'a str> {
        let (head, tail) = self
            .text
            .split_once(delim)
            .ok_or_else(|| malformed(&format!("missing '{}'", delim)))?;
        self.text = tail;
        Ok(head)
    }

    fn number<T: FromStr>(&mut self, delim: char) -> CatalogResult<T> {
        let digits = self.take_until(delim)?;
        digits
            .parse()
            .map_err(|_| malformed(&format!("number {:?}", digits)))
    }
}
