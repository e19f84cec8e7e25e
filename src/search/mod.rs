//! Tantivy-based tag-name index.
//!
//! Backs `tags search` with typo-tolerant matching, scoped to one guild.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, INDEXED, STORED, TEXT};
use tantivy::tokenizer::{TextAnalyzer, TokenStream};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Tag;

/// Tokens shorter than this must match with at most one edit.
const LONG_TOKEN: usize = 5;

/// Search index schema fields.
struct SearchFields {
    guild_id: Field,
    name: Field,
}

/// Tantivy index of live tag names.
pub struct TagSearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl TagSearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let guild_id = schema_builder.add_u64_field("guild_id", INDEXED | STORED);
        let name = schema_builder.add_text_field("name", TEXT | STORED);
        let schema = schema_builder.build();

        let fields = SearchFields { guild_id, name };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from every live tag.
    pub async fn rebuild(&self, tags: &[Tag]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for tag in tags {
            writer.add_document(self.create_document(tag))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        let guilds: HashSet<u64> = tags.iter().map(|t| t.guild_id).collect();
        tracing::info!(
            "Search index rebuilt with {} tags across {} guilds",
            tags.len(),
            guilds.len()
        );
        Ok(())
    }

    /// Replace the indexed names of one guild.
    pub async fn reindex_guild(&self, guild_id: u64, tags: &[Tag]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_u64(self.fields.guild_id, guild_id));
        for tag in tags.iter().filter(|t| t.guild_id == guild_id && !t.deleted) {
            writer.add_document(self.create_document(tag))?;
        }
        writer.commit()?;

        self.reader.reload()?;
        Ok(())
    }

    /// Tag names in a guild resembling `query`, best match first.
    pub fn search(&self, guild_id: u64, query: &str, limit: usize) -> Result<Vec<String>, AppError> {
        let tokens = self.tokenize(query);
        if tokens.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut name_queries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in &tokens {
            let term = Term::from_field_text(self.fields.name, token);
            let distance = if token.chars().count() >= LONG_TOKEN { 2 } else { 1 };
            name_queries.push((
                Occur::Should,
                Box::new(FuzzyTermQuery::new_prefix(term, distance, true)),
            ));
        }

        let guild_term = Term::from_field_u64(self.fields.guild_id, guild_id);
        let guild_query: Box<dyn Query> =
            Box::new(TermQuery::new(guild_term, IndexRecordOption::Basic));
        let name_query: Box<dyn Query> = Box::new(BooleanQuery::new(name_queries));
        let combined = BooleanQuery::new(vec![
            (Occur::Must, guild_query),
            (Occur::Must, name_query),
        ]);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&combined, &TopDocs::with_limit(limit))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let mut seen = HashSet::new();
        let names = top_docs
            .into_iter()
            .filter_map(|(_score, address)| {
                let doc: TantivyDocument = searcher.doc(address).ok()?;
                doc.get_first(self.fields.name)?
                    .as_str()
                    .map(str::to_string)
            })
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect();

        Ok(names)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut analyzer: TextAnalyzer = match self.index.tokenizer_for_field(self.fields.name) {
            Ok(analyzer) => analyzer,
            Err(_) => return Vec::new(),
        };
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        tokens
    }

    fn create_document(&self, tag: &Tag) -> TantivyDocument {
        doc!(
            self.fields.guild_id => tag.guild_id,
            self.fields.name => tag.name.clone()
        )
    }
}
