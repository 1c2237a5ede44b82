//! Upsert-by-name for every entity collection.
//!
//! A patch either merges into the record with the same name or becomes a
//! new record. Fields the patch omits keep their stored values, list fields
//! included.

use serde_json::{Map, Value};

use crate::entity::{
    AssetPatch, AssetRecord, CharacterPatch, CharacterRecord, CharacterTemplate, EventPatch,
    EventRecord, ForeshadowingPatch, ForeshadowingRecord,
};

/// Anything identified by a name within its collection.
pub trait Named {
    /// The identifying name.
    fn name(&self) -> &str;
}

/// A partial record that can be merged into or promoted to a full record.
pub trait Upsert {
    /// Record type this patch targets.
    type Record: Named;

    /// Name of the target record.
    fn name(&self) -> &str;

    /// Apply present fields over `record`.
    fn merge_into(self, record: &mut Self::Record);

    /// Build a new record, defaulting missing fields.
    fn into_record(self) -> Self::Record;
}

/// Outcome of [`upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    /// A new record was appended.
    Inserted,
    /// An existing record was merged.
    Merged,
}

/// Merge `patch` into the record with the same name, or append a new one.
pub fn upsert<P: Upsert>(items: &mut Vec<P::Record>, patch: P) -> (Upserted, &mut P::Record) {
    match items.iter().position(|r| r.name() == patch.name()) {
        Some(idx) => {
            let record = &mut items[idx];
            patch.merge_into(record);
            (Upserted::Merged, record)
        }
        None => {
            items.push(patch.into_record());
            let last = items.len() - 1;
            (Upserted::Inserted, &mut items[last])
        }
    }
}

/// Remove every record named `name`. Returns true if any matched.
pub fn remove_named<R: Named>(items: &mut Vec<R>, name: &str) -> bool {
    let len_before = items.len();
    items.retain(|r| r.name() != name);
    items.len() < len_before
}

/// Find a record by name.
pub fn find_named<'a, R: Named>(items: &'a [R], name: &str) -> Option<&'a R> {
    items.iter().find(|r| r.name() == name)
}

/// Find a record by name, mutably.
pub fn find_named_mut<'a, R: Named>(items: &'a mut [R], name: &str) -> Option<&'a mut R> {
    items.iter_mut().find(|r| r.name() == name)
}

fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn merge_extra(target: &mut Map<String, Value>, extra: Map<String, Value>) {
    target.extend(extra);
}

impl Named for EventRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ForeshadowingRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for CharacterRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for AssetRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Upsert for EventPatch {
    type Record = EventRecord;

    fn name(&self) -> &str {
        &self.name
    }

    fn merge_into(self, r: &mut EventRecord) {
        if let Some(d) = self.description {
            r.description = d;
        }
        merge_opt(&mut r.start_time, self.start_time);
        merge_opt(&mut r.expected_end_time, self.expected_end_time);
        merge_opt(&mut r.status, self.status);
        merge_opt(&mut r.importance, self.importance);
        if let Some(p) = self.participants {
            r.participants = p;
        }
        merge_opt(&mut r.current_time, self.current_time);
        merge_extra(&mut r.extra, self.extra);
    }

    fn into_record(self) -> EventRecord {
        EventRecord {
            name: self.name,
            description: self.description.unwrap_or_default(),
            start_time: self.start_time,
            expected_end_time: self.expected_end_time,
            status: self.status,
            importance: self.importance,
            participants: self.participants.unwrap_or_default(),
            current_time: self.current_time,
            extra: self.extra,
        }
    }
}

impl Upsert for ForeshadowingPatch {
    type Record = ForeshadowingRecord;

    fn name(&self) -> &str {
        &self.name
    }

    fn merge_into(self, r: &mut ForeshadowingRecord) {
        if let Some(d) = self.description {
            r.description = d;
        }
        merge_opt(&mut r.occurrence_time, self.occurrence_time);
        merge_opt(&mut r.importance, self.importance);
        merge_extra(&mut r.extra, self.extra);
    }

    fn into_record(self) -> ForeshadowingRecord {
        ForeshadowingRecord {
            name: self.name,
            description: self.description.unwrap_or_default(),
            occurrence_time: self.occurrence_time,
            importance: self.importance,
            extra: self.extra,
        }
    }
}

/// A character patch whose template has been resolved by the caller.
///
/// `template` is `None` when the patch gave none; a new record then falls
/// back to `default_template`.
#[derive(Debug, Clone)]
pub struct ResolvedCharacter {
    /// Patch data; its `template` string is ignored.
    pub patch: CharacterPatch,
    /// Template to store, if the patch asked for one.
    pub template: Option<CharacterTemplate>,
    /// Template for a brand-new record with no template.
    pub default_template: CharacterTemplate,
}

impl Upsert for ResolvedCharacter {
    type Record = CharacterRecord;

    fn name(&self) -> &str {
        &self.patch.name
    }

    fn merge_into(self, r: &mut CharacterRecord) {
        let p = self.patch;
        if let Some(d) = p.description {
            r.description = d;
        }
        merge_opt(&mut r.memory_points, p.memory_points);
        if let Some(t) = self.template {
            r.template = t;
        }
        merge_opt(&mut r.relationship, p.relationship);
        if let Some(things) = p.things_done {
            r.things_done = things;
        }
        merge_extra(&mut r.extra, p.extra);
    }

    fn into_record(self) -> CharacterRecord {
        let p = self.patch;
        CharacterRecord {
            name: p.name,
            description: p.description.unwrap_or_default(),
            memory_points: p.memory_points,
            template: self.template.unwrap_or(self.default_template),
            relationship: p.relationship,
            things_done: p.things_done.unwrap_or_default(),
            extra: p.extra,
        }
    }
}

impl Upsert for AssetPatch {
    type Record = AssetRecord;

    fn name(&self) -> &str {
        &self.name
    }

    fn merge_into(self, r: &mut AssetRecord) {
        if let Some(d) = self.description {
            r.description = d;
        }
        merge_opt(&mut r.owner, self.owner);
        merge_extra(&mut r.extra, self.extra);
    }

    fn into_record(self) -> AssetRecord {
        AssetRecord {
            name: self.name,
            description: self.description.unwrap_or_default(),
            owner: self.owner,
            extra: self.extra,
        }
    }
}
