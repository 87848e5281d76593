//! MangaDex API response types.
//!
//! Only the fields the adapter reads are modelled. Optional upstream fields
//! default when missing; a missing required field fails decoding.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

pub(crate) const COVER_ART: &str = "cover_art";
pub(crate) const SCANLATION_GROUP: &str = "scanlation_group";

#[derive(Debug, Deserialize)]
pub(crate) struct MangaListResponse {
    pub data: Vec<MangaData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MangaData {
    pub id: String,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MangaAttributes {
    #[serde(default)]
    pub title: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Relationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub attributes: Option<RelationshipAttributes>,
}

/// Union of the attributes we read from expanded relationships
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelationshipAttributes {
    /// Present on `cover_art`
    #[serde(default)]
    pub file_name: Option<String>,
    /// Present on `scanlation_group`
    #[serde(default)]
    pub name: Option<String>,
}

/// First expanded relationship of `rel_type`
pub(crate) fn first_relationship<'a>(
    relationships: &'a [Relationship],
    rel_type: &str,
) -> Option<&'a RelationshipAttributes> {
    relationships
        .iter()
        .find(|rel| rel.rel_type == rel_type)
        .and_then(|rel| rel.attributes.as_ref())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterFeedResponse {
    pub data: Vec<ChapterData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterData {
    pub id: String,
    pub attributes: ChapterAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChapterAttributes {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publish_at: Option<DateTime<Utc>>,
}

/// Volume label -> chapter number -> chapter ids
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AggregateResponse {
    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub volumes: BTreeMap<String, AggregateVolume>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AggregateVolume {
    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub chapters: BTreeMap<String, AggregateChapter>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AggregateChapter {
    pub id: String,
    /// Other uploads of the same chapter number (other groups)
    #[serde(default)]
    pub others: Vec<String>,
}

impl AggregateChapter {
    /// Primary id followed by the alternates
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.others.iter().map(String::as_str))
    }
}

/// The aggregate endpoint serializes an empty object as `[]`.
fn map_or_empty_list<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrList<T> {
        Map(BTreeMap<String, T>),
        List(Vec<serde_json::Value>),
    }

    match MapOrList::<T>::deserialize(deserializer)? {
        MapOrList::Map(map) => Ok(map),
        MapOrList::List(list) if list.is_empty() => Ok(BTreeMap::new()),
        MapOrList::List(_) => Err(de::Error::custom("expected an object keyed by label")),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AtHomeResponse {
    pub base_url: String,
    pub chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AtHomeChapter {
    pub hash: String,
    pub data: Vec<String>,
    pub data_saver: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_accepts_empty_list() {
        let aggregate: AggregateResponse =
            serde_json::from_str(r#"{"result":"ok","volumes":[]}"#).unwrap();
        assert!(aggregate.volumes.is_empty());

        let volume: AggregateVolume =
            serde_json::from_str(r#"{"volume":"1","count":0,"chapters":[]}"#).unwrap();
        assert!(volume.chapters.is_empty());
    }

    #[test]
    fn test_aggregate_rejects_non_empty_list() {
        let result = serde_json::from_str::<AggregateResponse>(r#"{"volumes":[{"volume":"1"}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_aggregate_chapter_ids() {
        let aggregate: AggregateResponse = serde_json::from_str(
            r#"{"volumes":{"1":{"volume":"1","chapters":{
                "3":{"chapter":"3","id":"x","others":["y","z"],"count":3}
            }}}}"#,
        )
        .unwrap();

        let chapter = &aggregate.volumes["1"].chapters["3"];
        assert_eq!(chapter.ids().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_chapter_attributes_nullable() {
        let chapter: ChapterData = serde_json::from_str(
            r#"{"id":"c1","attributes":{"title":null,"chapter":null,
                "createdAt":"2021-05-01T10:00:00+00:00","updatedAt":null}}"#,
        )
        .unwrap();

        assert!(chapter.attributes.title.is_none());
        assert!(chapter.attributes.chapter.is_none());
        assert!(chapter.attributes.created_at.is_some());
        assert!(chapter.attributes.publish_at.is_none());
        assert!(chapter.relationships.is_empty());
    }

    #[test]
    fn test_missing_required_field_fails() {
        assert!(serde_json::from_str::<AtHomeResponse>(r#"{"baseUrl":"https://cdn"}"#).is_err());
        assert!(serde_json::from_str::<MangaData>(r#"{"attributes":{}}"#).is_err());
    }

    #[test]
    fn test_first_relationship() {
        let rels: Vec<Relationship> = serde_json::from_str(
            r#"[{"id":"a","type":"author"},
                {"id":"g1","type":"scanlation_group","attributes":{"name":"First"}},
                {"id":"g2","type":"scanlation_group","attributes":{"name":"Second"}}]"#,
        )
        .unwrap();

        let group = first_relationship(&rels, SCANLATION_GROUP).unwrap();
        assert_eq!(group.name.as_deref(), Some("First"));
        assert!(first_relationship(&rels, COVER_ART).is_none());
    }
}
