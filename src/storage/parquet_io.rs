//! Reading and writing tables as Hive-style partitioned Parquet datasets.
//!
//! A table lives in one directory. Partition columns are not stored in the
//! files; they are encoded in the directory path as `column=value` segments
//! and re-attached when the table is read back.

use super::{Storage, SUCCESS_MARKER};
use crate::error::{EtlError, Result};
use crate::tables::TableRow;
use arrow::array::{new_null_array, Array, ArrayRef, Int32Array, Int64Array, StringArray, UInt32Array};
use arrow::compute::take_record_batch;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Directory value used for null partition values.
pub const NULL_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Outcome of a table write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteStats {
    pub rows: usize,
    pub files: usize,
}

/// Replace the table at `destination` with `rows`, partitioned by `partition_by`.
pub fn write_table<T: TableRow>(
    storage: &dyn Storage,
    destination: &Path,
    rows: &[T],
    partition_by: &[&str],
) -> Result<WriteStats> {
    let batch = T::to_batch(rows)?;
    let partitions = split_partitions(T::TABLE, &batch, partition_by)?;
    let write_id = Uuid::new_v4();

    let mut staged = storage.begin_overwrite(destination)?;
    for (index, (directory, part)) in partitions.iter().enumerate() {
        let file_name = format!("part-{:05}-{}.snappy.parquet", index, write_id);
        let relative = directory.join(file_name);
        let data = encode_parquet(part)?;
        debug!(
            "Writing {} rows of {} to {:?}",
            part.num_rows(),
            T::TABLE,
            relative
        );
        staged.put(&relative, &data)?;
    }
    staged.commit()?;

    let stats = WriteStats {
        rows: batch.num_rows(),
        files: partitions.len(),
    };
    info!(
        "Wrote table {}: {} rows in {} files to {:?}",
        T::TABLE,
        stats.rows,
        stats.files,
        destination
    );
    Ok(stats)
}

/// Read back every row of a committed table.
pub fn read_table<T: TableRow>(storage: &dyn Storage, location: &Path) -> Result<Vec<T>> {
    if !storage.exists(&location.join(SUCCESS_MARKER))? {
        return Err(EtlError::UncommittedTable {
            table: T::TABLE.to_string(),
            path: location.to_path_buf(),
        });
    }

    let schema = T::schema();
    let files = storage.list_files(location, "parquet")?;
    let per_file = files
        .par_iter()
        .map(|file| read_table_file::<T>(storage, location, file, &schema))
        .collect::<Result<Vec<Vec<T>>>>()?;
    let rows: Vec<T> = per_file.into_iter().flatten().collect();

    info!(
        "Read table {}: {} rows from {} files",
        T::TABLE,
        rows.len(),
        files.len()
    );
    Ok(rows)
}

fn read_table_file<T: TableRow>(
    storage: &dyn Storage,
    location: &Path,
    file: &Path,
    schema: &SchemaRef,
) -> Result<Vec<T>> {
    let partition_values = parse_partition_path(location, file);
    let bytes = storage.read_bytes(file)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes)
        .and_then(|builder| builder.build())
        .map_err(|source| EtlError::TableRead {
            path: file.to_path_buf(),
            source,
        })?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = attach_partition_columns(T::TABLE, batch?, &partition_values, schema)?;
        rows.extend(T::from_batch(&batch)?);
    }
    Ok(rows)
}

fn encode_parquet(batch: &RecordBatch) -> Result<Vec<u8>> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buf = Vec::with_capacity(batch.get_array_memory_size());
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buf)
}

/// Group rows by their partition values, in order of first appearance.
///
/// Returns the relative directory of every partition along with its rows,
/// stripped of the partition columns.
fn split_partitions(
    table: &'static str,
    batch: &RecordBatch,
    partition_by: &[&str],
) -> Result<Vec<(PathBuf, RecordBatch)>> {
    if partition_by.is_empty() {
        return Ok(vec![(PathBuf::new(), batch.clone())]);
    }

    let schema = batch.schema();
    let mut partition_columns = Vec::with_capacity(partition_by.len());
    for name in partition_by {
        let index = schema.index_of(name).map_err(|_| EtlError::TypeMismatch {
            table,
            column: name.to_string(),
            reason: "unknown partition column".to_string(),
        })?;
        partition_columns.push(index);
    }
    let data_columns: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !partition_columns.contains(i))
        .collect();

    let mut order: Vec<PathBuf> = Vec::new();
    let mut groups: HashMap<PathBuf, Vec<u32>> = HashMap::new();
    for row in 0..batch.num_rows() {
        let mut directory = PathBuf::new();
        for (name, &index) in partition_by.iter().zip(&partition_columns) {
            let value = partition_value(table, batch.column(index).as_ref(), row, name)?;
            directory.push(format!("{}={}", name, value));
        }
        groups
            .entry(directory.clone())
            .or_insert_with(|| {
                order.push(directory);
                Vec::new()
            })
            .push(row as u32);
    }

    order
        .into_iter()
        .map(|directory| {
            let indices = UInt32Array::from(groups.remove(&directory).unwrap_or_default());
            let part = take_record_batch(batch, &indices)?.project(&data_columns)?;
            Ok((directory, part))
        })
        .collect()
}

fn partition_value(table: &'static str, array: &dyn Array, row: usize, name: &str) -> Result<String> {
    if array.is_null(row) {
        return Ok(NULL_PARTITION.to_string());
    }
    let any = array.as_any();
    let value = match array.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| urlencoding::encode(a.value(row)).into_owned()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row).to_string()),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row).to_string()),
        _ => None,
    };
    value.ok_or_else(|| EtlError::TypeMismatch {
        table,
        column: name.to_string(),
        reason: format!("cannot partition by type {}", array.data_type()),
    })
}

/// Decode `column=value` directory segments between the table root and a file.
fn parse_partition_path(location: &Path, file: &Path) -> Vec<(String, Option<String>)> {
    let relative = file.strip_prefix(location).unwrap_or(file);
    let Some(parent) = relative.parent() else {
        return Vec::new();
    };
    parent
        .components()
        .filter_map(|component| {
            let segment = component.as_os_str().to_str()?;
            let (name, raw) = segment.split_once('=')?;
            let value = if raw == NULL_PARTITION {
                None
            } else {
                Some(
                    urlencoding::decode(raw)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| raw.to_string()),
                )
            };
            Some((name.to_string(), value))
        })
        .collect()
}

fn attach_partition_columns(
    table: &'static str,
    batch: RecordBatch,
    partition_values: &[(String, Option<String>)],
    schema: &SchemaRef,
) -> Result<RecordBatch> {
    if partition_values.is_empty() {
        return Ok(batch);
    }

    let rows = batch.num_rows();
    let mut fields: Vec<Arc<Field>> = batch.schema().fields().iter().cloned().collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    for (name, value) in partition_values {
        if fields.iter().any(|f| f.name() == name) {
            continue;
        }
        let field = schema.field_with_name(name).map_err(|_| EtlError::TypeMismatch {
            table,
            column: name.clone(),
            reason: "partition column is not part of the table schema".to_string(),
        })?;
        columns.push(constant_column(table, field, value.as_deref(), rows)?);
        fields.push(Arc::new(field.clone().with_nullable(true)));
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn constant_column(
    table: &'static str,
    field: &Field,
    value: Option<&str>,
    rows: usize,
) -> Result<ArrayRef> {
    let Some(value) = value else {
        return Ok(new_null_array(field.data_type(), rows));
    };
    let mismatch = |reason: String| EtlError::TypeMismatch {
        table,
        column: field.name().clone(),
        reason,
    };
    let array: ArrayRef = match field.data_type() {
        DataType::Utf8 => Arc::new(StringArray::from(vec![value; rows])),
        DataType::Int32 => {
            let v = value
                .parse::<i32>()
                .map_err(|e| mismatch(format!("partition value '{}': {}", value, e)))?;
            Arc::new(Int32Array::from(vec![v; rows]))
        }
        DataType::Int64 => {
            let v = value
                .parse::<i64>()
                .map_err(|e| mismatch(format!("partition value '{}': {}", value, e)))?;
            Arc::new(Int64Array::from(vec![v; rows]))
        }
        other => return Err(mismatch(format!("cannot partition by type {}", other))),
    };
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use crate::tables::{Song, SONGS_PARTITIONS};
    use tempfile::TempDir;

    fn song(id: &str, artist: &str, year: Option<i32>) -> Song {
        Song {
            song_id: id.to_string(),
            title: Some(format!("title of {}", id)),
            artist_id: artist.to_string(),
            year,
            duration: Some(100.5),
        }
    }

    #[test]
    fn test_partitioned_write_layout() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("songs");
        let storage = LocalStorage::new();
        let rows = vec![
            song("S1", "AR1", Some(2007)),
            song("S2", "AR2", Some(2007)),
            song("S3", "AR1", Some(2007)),
            song("S4", "AR1", None),
        ];

        let stats = write_table(&storage, &destination, &rows, SONGS_PARTITIONS).unwrap();
        assert_eq!(stats, WriteStats { rows: 4, files: 3 });
        assert!(destination.join("year=2007/artist_id=AR1").is_dir());
        assert!(destination.join("year=2007/artist_id=AR2").is_dir());
        assert!(destination
            .join(format!("year={}/artist_id=AR1", NULL_PARTITION))
            .is_dir());
        assert!(destination.join(SUCCESS_MARKER).exists());
    }

    #[test]
    fn test_rows_come_back_with_their_partition_values() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("songs");
        let storage = LocalStorage::new();
        let rows = vec![
            song("S1", "AR1", Some(2007)),
            song("S2", "AR/2", Some(1999)),
            song("S3", "AR1", None),
        ];
        write_table(&storage, &destination, &rows, SONGS_PARTITIONS).unwrap();

        let mut back: Vec<Song> = read_table(&storage, &destination).unwrap();
        back.sort_by(|a, b| a.song_id.cmp(&b.song_id));
        assert_eq!(back, rows);
    }

    #[test]
    fn test_empty_table_round_trips() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("songs");
        let storage = LocalStorage::new();

        write_table::<Song>(&storage, &destination, &[], SONGS_PARTITIONS).unwrap();
        let back: Vec<Song> = read_table(&storage, &destination).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_read_rejects_uncommitted_table() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("songs");
        std::fs::create_dir_all(&destination).unwrap();

        let err = read_table::<Song>(&LocalStorage::new(), &destination).unwrap_err();
        assert!(matches!(err, EtlError::UncommittedTable { .. }));
    }

    #[test]
    fn test_parse_partition_path() {
        let location = Path::new("/out/songplays");
        let file = Path::new("/out/songplays/year=2018/month=11/part-00000.parquet");
        assert_eq!(
            parse_partition_path(location, file),
            vec![
                ("year".to_string(), Some("2018".to_string())),
                ("month".to_string(), Some("11".to_string())),
            ]
        );

        let file = Path::new("/out/songplays/part-00000.parquet");
        assert!(parse_partition_path(location, file).is_empty());
    }
}
