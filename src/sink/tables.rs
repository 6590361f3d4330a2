//! Arrow schemas of the persisted tables

use super::Table;
use crate::error::Result;
use crate::features::PolicyClaim;
use crate::policy::{Categorical, ClaimEvent, PolicyRecord};
use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

fn policy_fields() -> Vec<Field> {
    vec![
        Field::new("policy_id", DataType::UInt32, false),
        Field::new("claim_count", DataType::UInt32, false),
        Field::new("exposure", DataType::Float64, false),
        Field::new("power", DataType::Utf8, false),
        Field::new("car_age", DataType::Float64, false),
        Field::new("driver_age", DataType::Float64, false),
        Field::new("brand", DataType::Utf8, false),
        Field::new("fuel", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("density", DataType::Float64, false),
    ]
}

/// Columns shared by the policy and policy-claim tables
fn policy_columns<'a, I>(rows: I) -> Vec<ArrayRef>
where
    I: Iterator<Item = &'a PolicyRecord> + Clone,
{
    vec![
        Arc::new(UInt32Array::from_iter_values(rows.clone().map(|p| p.policy_id))),
        Arc::new(UInt32Array::from_iter_values(rows.clone().map(|p| p.claim_count))),
        Arc::new(Float64Array::from_iter_values(rows.clone().map(|p| p.exposure))),
        Arc::new(StringArray::from_iter_values(rows.clone().map(|p| p.power.as_str()))),
        Arc::new(Float64Array::from_iter_values(rows.clone().map(|p| p.car_age))),
        Arc::new(Float64Array::from_iter_values(rows.clone().map(|p| p.driver_age))),
        Arc::new(StringArray::from_iter_values(rows.clone().map(|p| p.brand.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.clone().map(|p| p.fuel.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.clone().map(|p| p.region.as_str()))),
        Arc::new(Float64Array::from_iter_values(rows.map(|p| p.density))),
    ]
}

impl Table for PolicyRecord {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(policy_fields()))
    }

    fn record_batch(rows: &[Self]) -> Result<RecordBatch> {
        Ok(RecordBatch::try_new(Self::schema(), policy_columns(rows.iter()))?)
    }
}

impl Table for ClaimEvent {
    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("policy_id", DataType::UInt32, false),
            Field::new("claim_amount", DataType::Float64, false),
        ]))
    }

    fn record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|c| c.policy_id))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|c| c.claim_amount))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}

impl Table for PolicyClaim {
    fn schema() -> SchemaRef {
        let mut fields = policy_fields();
        fields.extend([
            Field::new("total_claims", DataType::Float64, false),
            Field::new("cat_driver_age", DataType::Utf8, false),
            Field::new("cat_car_age", DataType::Utf8, false),
            Field::new("cat_density", DataType::Utf8, false),
            Field::new("agg_power", DataType::Utf8, false),
            Field::new("agg_power_2", DataType::Utf8, false),
            Field::new("agg_region", DataType::Utf8, false),
        ]);
        Arc::new(Schema::new(fields))
    }

    fn record_batch(rows: &[Self]) -> Result<RecordBatch> {
        let policies: Vec<PolicyRecord> = rows.iter().map(PolicyClaim::policy).collect();
        let mut columns = policy_columns(policies.iter());
        let derived: Vec<ArrayRef> = vec![
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_claims))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.cat_driver_age.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.cat_car_age.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.cat_density.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.agg_power))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.agg_power_2))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.agg_region))),
        ];
        columns.extend(derived);
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }
}
