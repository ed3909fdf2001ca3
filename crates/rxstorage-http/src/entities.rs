//! Searchable entities and their list endpoints.

use std::fmt;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use rxstorage_core::{Identifiable, Page, PageRequest, PageSource, Result};

use crate::client::ApiClient;

/// Entity-specific filters rendered as query parameters.
pub trait QueryFilter {
    /// Append this filter's parameters; unset filters add nothing.
    fn append_pairs(&self, pairs: &mut Vec<(&'static str, String)>);
}

impl QueryFilter for () {
    fn append_pairs(&self, _pairs: &mut Vec<(&'static str, String)>) {}
}

/// A resource with a list endpoint at [`Entity::PATH`] and a detail
/// endpoint at `PATH/{id}`.
pub trait Entity:
    Identifiable<Id = i64> + DeserializeOwned + Serialize + Clone + Send + Sync + 'static
{
    const PATH: &'static str;
    type Filter: QueryFilter + Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// Filters accepted by the items endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub author_id: Option<i64>,
    pub visibility: Option<Visibility>,
}

impl QueryFilter for ItemFilter {
    fn append_pairs(&self, pairs: &mut Vec<(&'static str, String)>) {
        if let Some(id) = self.category_id {
            pairs.push(("categoryId", id.to_string()));
        }
        if let Some(id) = self.location_id {
            pairs.push(("locationId", id.to_string()));
        }
        if let Some(id) = self.author_id {
            pairs.push(("authorId", id.to_string()));
        }
        if let Some(visibility) = self.visibility {
            pairs.push(("visibility", visibility.as_str().to_string()));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A user-defined schema describing the fields of item positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSchema {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub schema: serde_json::Value,
}

impl Identifiable for Item {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Identifiable for Category {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Identifiable for Location {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Identifiable for Author {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Identifiable for PositionSchema {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Item {
    const PATH: &'static str = "api/v1/items";
    type Filter = ItemFilter;
}

impl Entity for Category {
    const PATH: &'static str = "api/v1/categories";
    type Filter = ();
}

impl Entity for Location {
    const PATH: &'static str = "api/v1/locations";
    type Filter = ();
}

impl Entity for Author {
    const PATH: &'static str = "api/v1/authors";
    type Filter = ();
}

impl Entity for PositionSchema {
    const PATH: &'static str = "api/v1/position-schemas";
    type Filter = ();
}

/// The list endpoint of `E` as a [`PageSource`].
pub struct EntityList<E> {
    client: ApiClient,
    _entity: PhantomData<fn() -> E>,
}

impl<E> EntityList<E> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for EntityList<E> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<E> fmt::Debug for EntityList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityList")
            .field("entity", &std::any::type_name::<E>())
            .finish()
    }
}

#[async_trait]
impl<E: Entity> PageSource for EntityList<E> {
    type Item = E;
    type Filter = E::Filter;

    async fn fetch_page(&self, request: &PageRequest<E::Filter>) -> Result<Page<E>> {
        self.client.list::<E>(request).await
    }
}
