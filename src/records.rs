use polars::prelude::{DataFrame, DataType, Field, NamedFrom, PolarsResult, Schema, Series};
use serde::{Deserialize, Serialize};

pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const ETHNICITY: &str = "ethnicity";
pub const HEIGHT: &str = "height";
pub const WEIGHT: &str = "weight";
pub const DIABETES_MELLITUS: &str = "diabetes_mellitus";

pub const COMORBIDITY_FLAGS: [&str; 7] = [
    "aids",
    "cirrhosis",
    "hepatic_failure",
    "immunosuppression",
    "leukemia",
    "lymphoma",
    "solid_tumor_with_metastasis",
];

/// One patient row. Every field may be missing, both in the CSV and in a
/// JSON payload sent to the server; unknown JSON keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiabetesRecord {
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub aids: Option<i32>,
    pub cirrhosis: Option<i32>,
    pub hepatic_failure: Option<i32>,
    pub immunosuppression: Option<i32>,
    pub leukemia: Option<i32>,
    pub lymphoma: Option<i32>,
    pub solid_tumor_with_metastasis: Option<i32>,
    pub diabetes_mellitus: Option<i32>,
}

impl DiabetesRecord {
    /// Column types forced when reading the raw CSV. Columns not listed here
    /// keep whatever polars infers.
    pub fn raw_schema() -> Schema {
        let mut fields = vec![
            Field::new(AGE, DataType::Float64),
            Field::new(GENDER, DataType::Utf8),
            Field::new(ETHNICITY, DataType::Utf8),
            Field::new(HEIGHT, DataType::Float64),
            Field::new(WEIGHT, DataType::Float64),
        ];
        fields.extend(
            COMORBIDITY_FLAGS
                .iter()
                .map(|flag| Field::new(flag, DataType::Int32)),
        );
        fields.push(Field::new(DIABETES_MELLITUS, DataType::Int32));

        Schema::from_iter(fields)
    }

    fn flags(&self) -> [Option<i32>; 7] {
        [
            self.aids,
            self.cirrhosis,
            self.hepatic_failure,
            self.immunosuppression,
            self.leukemia,
            self.lymphoma,
            self.solid_tumor_with_metastasis,
        ]
    }

    /// Builds a table with the raw schema from in-memory rows.
    pub fn to_frame(records: &[DiabetesRecord]) -> PolarsResult<DataFrame> {
        let mut columns = vec![
            Series::new(AGE, records.iter().map(|r| r.age).collect::<Vec<_>>()),
            Series::new(
                GENDER,
                records
                    .iter()
                    .map(|r| r.gender.as_deref())
                    .collect::<Vec<Option<&str>>>(),
            ),
            Series::new(
                ETHNICITY,
                records
                    .iter()
                    .map(|r| r.ethnicity.as_deref())
                    .collect::<Vec<Option<&str>>>(),
            ),
            Series::new(HEIGHT, records.iter().map(|r| r.height).collect::<Vec<_>>()),
            Series::new(WEIGHT, records.iter().map(|r| r.weight).collect::<Vec<_>>()),
        ];
        for (i, flag) in COMORBIDITY_FLAGS.iter().enumerate() {
            let values: Vec<Option<i32>> = records.iter().map(|r| r.flags()[i]).collect();
            columns.push(Series::new(flag, values));
        }
        columns.push(Series::new(
            DIABETES_MELLITUS,
            records
                .iter()
                .map(|r| r.diabetes_mellitus)
                .collect::<Vec<_>>(),
        ));

        DataFrame::new(columns)
    }
}
