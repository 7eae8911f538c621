//! Tantivy-based catalog search.
//!
//! Indexes courses and blog posts with field boosting so the catalog page
//! can offer free-text search.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{BlogPost, Course, Record};

const BOOST_TITLE: f32 = 10.0;
const BOOST_CATEGORY: f32 = 6.0;
const BOOST_DESCRIPTION: f32 = 5.0;
const BOOST_SYLLABUS: f32 = 3.0;
const BOOST_BODY: f32 = 2.0;

/// Deepest rank a search will collect, whatever offset is asked for.
pub const MAX_RESULT_WINDOW: usize = 1_000;

/// What kind of catalog entry a hit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Course,
    Blog,
}

impl EntryKind {
    fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Course => "course",
            EntryKind::Blog => "blog",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "course" => Some(EntryKind::Course),
            "blog" => Some(EntryKind::Blog),
            _ => None,
        }
    }
}

/// Search hit with its relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub kind: EntryKind,
    pub id: String,
    pub score: f32,
}

/// One page of hits and the number of matches overall.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub total: usize,
    pub hits: Vec<SearchResult>,
}

/// Flattened text of one catalog entry.
struct CatalogEntry<'a> {
    kind: EntryKind,
    id: &'a str,
    title: &'a str,
    category: &'a str,
    description: String,
    syllabus: String,
    body: &'a str,
}

impl<'a> CatalogEntry<'a> {
    fn course(record: &'a Record<Course>) -> Self {
        let course = &record.fields;
        let syllabus = course
            .curriculum
            .iter()
            .flat_map(|section| std::iter::once(&section.section_title).chain(&section.items))
            .chain(&course.career_opportunities)
            .map(String::as_str)
            .chain(course.tools_and_technologies.as_deref())
            .chain(course.what_you_will_learn.as_deref())
            .collect::<Vec<_>>()
            .join(" ");
        let description = [Some(course.description.as_str()), course.overview.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            kind: EntryKind::Course,
            id: &record.id,
            title: &course.title,
            category: &course.category,
            description,
            syllabus,
            body: &course.content,
        }
    }

    fn blog(record: &'a Record<BlogPost>) -> Self {
        Self {
            kind: EntryKind::Blog,
            id: &record.id,
            title: &record.fields.title,
            category: &record.fields.category,
            description: String::new(),
            syllabus: String::new(),
            body: &record.fields.content,
        }
    }
}

struct SearchFields {
    key: Field,
    kind: Field,
    entry_id: Field,
    title: Field,
    category: Field,
    description: Field,
    syllabus: Field,
    body: Field,
}

/// Tantivy search index over the catalog.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        // "<kind>:<id>", unique per entry
        let key = schema_builder.add_text_field("key", STRING);
        let kind = schema_builder.add_text_field("kind", STRING | STORED);
        let entry_id = schema_builder.add_text_field("entry_id", STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let category = schema_builder.add_text_field("category", TEXT);
        let description = schema_builder.add_text_field("description", TEXT);
        let syllabus = schema_builder.add_text_field("syllabus", TEXT);
        let body = schema_builder.add_text_field("body", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            key,
            kind,
            entry_id,
            title,
            category,
            description,
            syllabus,
            body,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
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

    /// Rebuild the entire index.
    pub async fn rebuild(
        &self,
        courses: &[Record<Course>],
        posts: &[Record<BlogPost>],
    ) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_all_documents()?;

        for course in courses {
            writer.add_document(self.create_document(&CatalogEntry::course(course)))?;
        }
        for post in posts {
            writer.add_document(self.create_document(&CatalogEntry::blog(post)))?;
        }

        writer.commit()?;
        self.reader.reload()?;

        tracing::info!(
            courses = courses.len(),
            posts = posts.len(),
            "Catalog index rebuilt"
        );
        Ok(())
    }

    pub async fn index_course(&self, course: &Record<Course>) -> Result<(), AppError> {
        self.upsert(&CatalogEntry::course(course)).await
    }

    pub async fn index_blog_post(&self, post: &Record<BlogPost>) -> Result<(), AppError> {
        self.upsert(&CatalogEntry::blog(post)).await
    }

    /// Remove an entry from the index.
    pub async fn remove(&self, kind: EntryKind, id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_term(self.key_term(kind, id));
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    async fn upsert(&self, entry: &CatalogEntry<'_>) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_term(self.key_term(entry.kind, entry.id));
        writer.add_document(self.create_document(entry))?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Search the catalog, optionally restricted to one kind of entry.
    ///
    /// Hits past [`MAX_RESULT_WINDOW`] are never collected; `total` still
    /// counts every match.
    pub fn search(
        &self,
        query_str: &str,
        kind: Option<EntryKind>,
        limit: usize,
        offset: usize,
    ) -> Result<SearchPage, AppError> {
        if query_str.trim().is_empty() || limit == 0 {
            return Ok(SearchPage::default());
        }

        let query = self.build_query(query_str, kind)?;
        let searcher = self.reader.searcher();

        let window = limit.saturating_add(offset).min(MAX_RESULT_WINDOW);
        let (total, top_docs) = searcher
            .search(query.as_ref(), &(Count, TopDocs::with_limit(window)))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let hits = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let kind = EntryKind::parse(doc.get_first(self.fields.kind)?.as_str()?)?;
                let id = doc.get_first(self.fields.entry_id)?.as_str()?.to_string();
                Some(SearchResult { kind, id, score })
            })
            .collect();

        Ok(SearchPage { total, hits })
    }

    fn build_query(
        &self,
        query_str: &str,
        kind: Option<EntryKind>,
    ) -> Result<Box<dyn Query>, AppError> {
        // Reject malformed queries up front with a readable error
        QueryParser::for_index(&self.index, self.text_fields().to_vec())
            .parse_query(query_str)
            .map_err(|e| AppError::Validation(format!("Invalid search query: {}", e)))?;

        let field_queries = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.category, BOOST_CATEGORY),
            (self.fields.description, BOOST_DESCRIPTION),
            (self.fields.syllabus, BOOST_SYLLABUS),
            (self.fields.body, BOOST_BODY),
        ];

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let text_query: Box<dyn Query> = Box::new(BooleanQuery::new(subqueries));
        Ok(match kind {
            Some(kind) => {
                let kind_query = TermQuery::new(
                    Term::from_field_text(self.fields.kind, kind.as_str()),
                    IndexRecordOption::Basic,
                );
                Box::new(BooleanQuery::new(vec![
                    (Occur::Must, text_query),
                    (Occur::Must, Box::new(kind_query)),
                ]))
            }
            None => text_query,
        })
    }

    fn text_fields(&self) -> [Field; 5] {
        [
            self.fields.title,
            self.fields.category,
            self.fields.description,
            self.fields.syllabus,
            self.fields.body,
        ]
    }

    fn key_term(&self, kind: EntryKind, id: &str) -> Term {
        Term::from_field_text(self.fields.key, &format!("{}:{}", kind.as_str(), id))
    }

    fn create_document(&self, entry: &CatalogEntry<'_>) -> TantivyDocument {
        doc!(
            self.fields.key => format!("{}:{}", entry.kind.as_str(), entry.id),
            self.fields.kind => entry.kind.as_str(),
            self.fields.entry_id => entry.id,
            self.fields.title => entry.title,
            self.fields.category => entry.category,
            self.fields.description => entry.description.as_str(),
            self.fields.syllabus => entry.syllabus.as_str(),
            self.fields.body => entry.body
        )
    }
}
