
use super::{ChunkMetadata, IndexRecord};
use crate::AssistantError;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const TABLE_NAME: &str = "chunks";

/// Vector index over document chunks, persisted as a LanceDB directory
pub struct VectorStore {
    table: Table,
    path: PathBuf,
    vector_dimension: usize,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk_metadata: ChunkMetadata,
    pub distance: f32,
}

impl VectorStore {
    /// Create a fresh, empty index at `path`, replacing anything already there
    ///
    /// # Arguments
    /// * `path` - Directory for the LanceDB database
    /// * `vector_dimension` - Length of every embedding that will be stored
    ///
    /// # Returns
    /// * `Result<Self, AssistantError>` - New VectorStore instance or error
    #[inline]
    pub async fn create(path: &Path, vector_dimension: usize) -> Result<Self, AssistantError> {
        if vector_dimension == 0 {
            return Err(AssistantError::Index(
                "Vector dimension must be greater than zero".to_string(),
            ));
        }

        if path.exists() {
            debug!("Removing existing database at {:?}", path);
            std::fs::remove_dir_all(path).map_err(|e| {
                AssistantError::Index(format!("Failed to clear index directory: {}", e))
            })?;
        }

        let connection = Self::connect(path).await?;

        let table = connection
            .create_empty_table(TABLE_NAME, create_schema(vector_dimension))
            .execute()
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to create table: {}", e)))?;

        info!(
            "Created index at {:?} with {} dimensions",
            path, vector_dimension
        );

        Ok(Self {
            table,
            path: path.to_path_buf(),
            vector_dimension,
        })
    }

    /// Open an existing index for querying
    ///
    /// # Arguments
    /// * `path` - Directory of a database written by [`VectorStore::create`]
    ///
    /// # Returns
    /// * `Result<Self, AssistantError>` - Opened VectorStore or error
    #[inline]
    pub async fn open(path: &Path) -> Result<Self, AssistantError> {
        if !path.is_dir() {
            return Err(AssistantError::Index(format!(
                "Index not found at {}",
                path.display()
            )));
        }

        let connection = Self::connect(path).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to list tables: {}", e)))?;

        if !table_names.iter().any(|name| name == TABLE_NAME) {
            return Err(AssistantError::Index(format!(
                "Index at {} has no '{}' table",
                path.display(),
                TABLE_NAME
            )));
        }

        let table = connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to open table: {}", e)))?;

        let vector_dimension = detect_vector_dimension(&table).await?;
        info!(
            "Opened index at {:?} ({} dimensions)",
            path, vector_dimension
        );

        Ok(Self {
            table,
            path: path.to_path_buf(),
            vector_dimension,
        })
    }

    async fn connect(path: &Path) -> Result<Connection, AssistantError> {
        let uri = path.to_string_lossy();
        debug!("Connecting to LanceDB at {}", uri);

        lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to connect to LanceDB: {}", e)))
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    /// Store multiple records in a batch
    ///
    /// # Arguments
    /// * `records` - Records whose vectors all match the index dimension
    ///
    /// # Returns
    /// * `Result<(), AssistantError>` - Success or error
    #[inline]
    pub async fn store_records(&mut self, records: &[IndexRecord]) -> Result<(), AssistantError> {
        if records.is_empty() {
            debug!("No records to store");
            return Ok(());
        }

        if let Some(record) = records
            .iter()
            .find(|r| r.vector.len() != self.vector_dimension)
        {
            return Err(AssistantError::Index(format!(
                "Record {} has {} dimensions, index expects {}",
                record.id,
                record.vector.len(),
                self.vector_dimension
            )));
        }

        debug!("Storing batch of {} records", records.len());

        let record_batch = self.create_record_batch(records)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        self.table
            .add(reader)
            .execute()
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to insert records: {}", e)))?;

        debug!("Stored {} records", records.len());
        Ok(())
    }

    /// Create a RecordBatch from index records
    fn create_record_batch(&self, records: &[IndexRecord]) -> Result<RecordBatch, AssistantError> {
        let len = records.len();
        let vector_dim = self.vector_dimension;

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);
        let mut sources = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            sources.push(record.metadata.source.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            contents.push(record.metadata.content.as_str());
            created_ats.push(record.metadata.created_at.as_str());
        }

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::try_new(
            field,
            dimension_as_i32(vector_dim)?,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| AssistantError::Index(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(create_schema(vector_dim), arrays)
            .map_err(|e| AssistantError::Index(format!("Failed to create record batch: {}", e)))
    }

    /// Search for the chunks nearest to `query_vector`, closest first
    ///
    /// # Arguments
    /// * `query_vector` - The query vector to search for
    /// * `limit` - Maximum number of results to return
    ///
    /// # Returns
    /// * `Result<Vec<SearchResult>, AssistantError>` - Search results or error
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, AssistantError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        if query_vector.len() != self.vector_dimension {
            return Err(AssistantError::Index(format!(
                "Query has {} dimensions, index expects {}",
                query_vector.len(),
                self.vector_dimension
            )));
        }

        let mut results = self
            .table
            .vector_search(query_vector)
            .map_err(|e| AssistantError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(parse_search_batch(&batch)?);
        }

        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        search_results.truncate(limit);

        debug!("Parsed {} search results", search_results.len());
        Ok(search_results)
    }

    /// Get the total number of records stored
    ///
    /// # Returns
    /// * `Result<u64, AssistantError>` - Total count or error
    #[inline]
    pub async fn count_records(&self) -> Result<u64, AssistantError> {
        let count = self
            .table
            .count_rows(None)
            .await
            .map_err(|e| AssistantError::Index(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}

/// Create schema with the specified vector dimension
fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                i32::try_from(vector_dim).unwrap_or(i32::MAX),
            ),
            false,
        ),
        Field::new("source", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn dimension_as_i32(vector_dim: usize) -> Result<i32, AssistantError> {
    i32::try_from(vector_dim)
        .map_err(|_| AssistantError::Index(format!("Vector dimension {} is too large", vector_dim)))
}

/// Detect vector dimension from existing table schema
async fn detect_vector_dimension(table: &Table) -> Result<usize, AssistantError> {
    let schema = table
        .schema()
        .await
        .map_err(|e| AssistantError::Index(format!("Failed to get table schema: {}", e)))?;

    for field in schema.fields() {
        if field.name() == "vector" {
            if let DataType::FixedSizeList(_, size) = field.data_type() {
                return usize::try_from(*size).map_err(|_| {
                    AssistantError::Index(format!("Invalid vector dimension: {}", size))
                });
            }
        }
    }

    Err(AssistantError::Index(
        "Could not find vector column or determine dimension".to_string(),
    ))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, AssistantError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| AssistantError::Index(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| AssistantError::Index(format!("Invalid {} column type", name)))
}

/// Parse a single record batch from search results
fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, AssistantError> {
    let sources = string_column(batch, "source")?;
    let contents = string_column(batch, "content")?;
    let created_ats = string_column(batch, "created_at")?;

    let chunk_indices = batch
        .column_by_name("chunk_index")
        .ok_or_else(|| AssistantError::Index("Missing chunk_index column".to_string()))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| AssistantError::Index("Invalid chunk_index column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    let results = (0..batch.num_rows())
        .map(|row| SearchResult {
            chunk_metadata: ChunkMetadata {
                source: sources.value(row).to_string(),
                chunk_index: chunk_indices.value(row),
                content: contents.value(row).to_string(),
                created_at: created_ats.value(row).to_string(),
            },
            distance: distances
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) }),
        })
        .collect();

    Ok(results)
}
