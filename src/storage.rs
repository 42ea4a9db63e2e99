//! Storage for saving and loading decks.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Deck, ReviewItem};

/// Load/save contract the engine expects from a persistence layer.
pub trait DeckStore {
    fn load(&self, deck_id: &str) -> Result<Option<Deck>>;
    fn save(&self, deck: &Deck) -> Result<()>;
    fn list(&self) -> Result<Vec<DeckInfo>>;
    fn delete(&self, deck_id: &str) -> Result<bool>;
}

/// Summary info for a deck.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckInfo {
    pub id: String,
    pub name: String,
    pub item_count: usize,
    pub description: String,
}

/// One pretty-printed JSON file per deck.
pub struct JsonDeckStore {
    decks_dir: PathBuf,
}

impl JsonDeckStore {
    pub fn new(decks_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&decks_dir)
            .with_context(|| format!("Failed to create decks directory: {:?}", decks_dir))?;
        tracing::debug!("Using deck directory {:?}", decks_dir);
        Ok(Self { decks_dir })
    }

    /// Get default storage location.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("srl")
            .join("decks")
    }

    pub fn decks_dir(&self) -> &Path {
        &self.decks_dir
    }

    /// Path of a deck file. Ids must stay inside the deck directory.
    fn deck_path(&self, deck_id: &str) -> Result<PathBuf> {
        if !is_valid_deck_id(deck_id) {
            bail!("Invalid deck id: {:?}", deck_id);
        }
        Ok(self.decks_dir.join(format!("{}.json", deck_id)))
    }

    /// Find a deck by id, or by case-insensitive name.
    pub fn find(&self, id_or_name: &str) -> Result<Option<Deck>> {
        if is_valid_deck_id(id_or_name) {
            if let Some(deck) = self.load(id_or_name)? {
                return Ok(Some(deck));
            }
        }
        let matched = self
            .list()?
            .into_iter()
            .find(|info| info.name.eq_ignore_ascii_case(id_or_name));
        match matched {
            Some(info) => self.load(&info.id),
            None => Ok(None),
        }
    }

    /// Build a deck from a CSV file of `front,back[,category]` rows.
    ///
    /// Fields may be quoted, so `"to go, to walk"` stays one field. A first
    /// row mentioning "front" is treated as a header.
    pub fn import_csv(&self, csv_path: &Path, deck_name: &str, now: DateTime<Local>) -> Result<Deck> {
        let content = fs::read_to_string(csv_path)
            .with_context(|| format!("Failed to read CSV file: {:?}", csv_path))?;
        let mut deck = Deck::new(deck_name.to_string(), now);
        let mut skipped = 0usize;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        for (i, result) in reader.records().enumerate() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("Unparseable CSV row {}: {}", i + 1, e);
                    skipped += 1;
                    continue;
                }
            };

            // Skip header
            if i == 0 && record.iter().any(|f| f.to_lowercase().contains("front")) {
                continue;
            }

            match (record.get(0), record.get(1)) {
                (Some(front), Some(back)) if !front.is_empty() && !back.is_empty() => {
                    let mut item = ReviewItem::new(front.to_string(), back.to_string(), now);
                    item.category = record.get(2).unwrap_or_default().to_string();
                    deck.insert(item);
                }
                _ if record.iter().all(str::is_empty) => {}
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed rows in {:?}", skipped, csv_path);
        }
        tracing::info!("Imported {} items from {:?}", deck.len(), csv_path);
        Ok(deck)
    }
}

impl DeckStore for JsonDeckStore {
    /// Load a deck from disk.
    fn load(&self, deck_id: &str) -> Result<Option<Deck>> {
        let path = self.deck_path(deck_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read deck file: {:?}", path))?;
        let deck: Deck = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse deck file: {:?}", path))?;
        tracing::debug!(deck = %deck.id, items = deck.len(), "Loaded deck");
        Ok(Some(deck))
    }

    /// Save a deck to disk.
    fn save(&self, deck: &Deck) -> Result<()> {
        let path = self.deck_path(&deck.id)?;
        let json = serde_json::to_string_pretty(deck)?;
        fs::write(&path, json).with_context(|| format!("Failed to write deck file: {:?}", path))?;
        tracing::debug!(deck = %deck.id, items = deck.len(), "Saved deck");
        Ok(())
    }

    /// List all available decks, sorted by name.
    fn list(&self) -> Result<Vec<DeckInfo>> {
        let mut decks = Vec::new();

        for entry in fs::read_dir(&self.decks_dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                let parsed = fs::read_to_string(&path)
                    .map_err(anyhow::Error::from)
                    .and_then(|json| serde_json::from_str::<Deck>(&json).map_err(Into::into));
                match parsed {
                    Ok(deck) => decks.push(DeckInfo {
                        item_count: deck.len(),
                        id: deck.id,
                        name: deck.name,
                        description: deck.description,
                    }),
                    Err(e) => tracing::warn!("Skipping unreadable deck {:?}: {}", path, e),
                }
            }
        }

        decks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(decks)
    }

    /// Delete a deck file.
    fn delete(&self, deck_id: &str) -> Result<bool> {
        let path = self.deck_path(deck_id)?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete deck file: {:?}", path))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Deck ids name a single file in the deck directory.
fn is_valid_deck_id(deck_id: &str) -> bool {
    !deck_id.is_empty()
        && deck_id != "."
        && !deck_id.contains("..")
        && !deck_id.contains(['/', '\\', '\0'])
}
