use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::application::errors::StorageError;

/// Field holding a document's identity
pub const ID_FIELD: &str = "_id";
/// Field holding the owner key used by `get_or_create`
pub const OWNER_FIELD: &str = "server";
/// Field holding the value of owner-keyed entries
pub const VALUE_FIELD: &str = "val";

/// A schemaless document in a named collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// `None` until the document has been saved
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of a field; missing, null and non-string fields yield `None`
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq(name, value) => field(doc, name) == value,
            Filter::Ne(name, value) => field(doc, name) != value,
            Filter::In(name, values) => values.contains(field(doc, name)),
        }
    }
}

/// Filter, sort and limit over one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    sort: Option<(String, SortOrder)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq(ID_FIELD, id.into())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.into(), value.into()));
        self
    }

    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Ne(field.into(), value.into()));
        self
    }

    pub fn any_of<V: Into<Value>>(mut self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter::In(field.into(), values));
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Run the query over an in-memory candidate set
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut out: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some((field, order)) = &self.sort {
            out.sort_by(|a, b| {
                let ord = compare_values(self::field(a, field), self::field(b, field));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

fn field<'a>(doc: &'a Document, name: &str) -> &'a Value {
    doc.get(name).unwrap_or(&Value::Null)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Store trait - persistent document storage for commands
#[async_trait]
pub trait Store: Send + Sync {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StorageError>;

    /// Insert or replace; assigns an id to unsaved documents
    async fn save(&self, collection: &str, doc: &mut Document) -> Result<(), StorageError>;

    /// Remove every matching document and return how many went
    async fn remove(&self, collection: &str, query: &Query) -> Result<usize, StorageError>;

    /// Release the underlying connection; later calls fail with `Unavailable`
    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// The entry owned by `owner`, or a fresh unsaved one holding `default`
    async fn get_or_create(
        &self,
        collection: &str,
        owner: &str,
        default: Value,
    ) -> Result<Document, StorageError> {
        let query = Query::new().eq(OWNER_FIELD, owner).limit(1);
        let found = self.find(collection, &query).await?;
        Ok(found.into_iter().next().unwrap_or_else(|| {
            Document::new()
                .with(OWNER_FIELD, owner)
                .with(VALUE_FIELD, default)
        }))
    }
}
