use std::path::Path;

use anyhow::{Context, Result};
use modelguard_core::checks::schema::parse_logical_type;
use modelguard_core::{
    load_table, AnomalyCheck, Batch, ConsistencyCheck, DatasetCheck, NullCheck, RangeCheck,
    SchemaCheck,
};

use crate::errors::ConfigError;
use crate::parser::{CheckConfig, Consistency, Table};

pub fn load(table: &Table) -> Result<Batch> {
    if !Path::new(&table.path).exists() {
        return Err(ConfigError::FileNotFound {
            table_path: table.path.clone(),
        }
        .into());
    }
    load_table(&table.path).with_context(|| format!("Failed to load table: '{}'", table.name))
}

fn threshold(table: &str, kind: &str, value: f64) -> Result<f64, ConfigError> {
    if value < 0.0 {
        return Err(ConfigError::InvalidThreshold {
            table: table.to_string(),
            kind: kind.to_string(),
            value,
        });
    }
    Ok(value)
}

pub fn construct_check(table: &str, config: &CheckConfig) -> Result<Box<dyn DatasetCheck>, ConfigError> {
    let check: Box<dyn DatasetCheck> = match config {
        CheckConfig::Null { threshold: t } => match t {
            Some(t) => Box::new(NullCheck::new(threshold(table, "null", *t)?)),
            None => Box::new(NullCheck::default()),
        },
        CheckConfig::Schema {
            expected,
            required,
            types,
        } => {
            let mut check = SchemaCheck::new(expected.iter().cloned()).with_required(required.iter().cloned());
            for (column, type_name) in types {
                let data_type = parse_logical_type(type_name).map_err(|e| ConfigError::ColumnType {
                    column: column.clone(),
                    message: e.to_string(),
                })?;
                check = check.with_column_type(column.clone(), data_type);
            }
            Box::new(check)
        }
        CheckConfig::Anomaly {
            z_threshold,
            columns,
        } => {
            let mut check = match z_threshold {
                Some(z) => AnomalyCheck::new(threshold(table, "anomaly", *z)?),
                None => AnomalyCheck::default(),
            };
            if let Some(columns) = columns {
                check = check.with_columns(columns.iter().cloned());
            }
            Box::new(check)
        }
        CheckConfig::Range { bounds } => {
            let mut check = RangeCheck::new();
            for (column, [min, max]) in bounds {
                if min > max {
                    return Err(ConfigError::InvalidBounds {
                        column: column.clone(),
                        min: *min,
                        max: *max,
                    });
                }
                check = check.with_bounds(column.clone(), *min, *max);
            }
            Box::new(check)
        }
    };
    Ok(check)
}

pub fn construct_consistency(
    config: &Consistency,
    tables: &[Table],
) -> Result<ConsistencyCheck, ConfigError> {
    for name in [&config.child_table, &config.parent_table] {
        if !tables.iter().any(|t| &t.name == name) {
            return Err(ConfigError::UnknownTable {
                table: name.clone(),
            });
        }
    }
    Ok(ConsistencyCheck::new(
        config.child_table.clone(),
        config.child_column.clone(),
        config.parent_table.clone(),
        config.parent_column.clone(),
    ))
}
