//! Turns one [`RawRecord`] into one [`StopDocument`].
//!
//! Stages run in a fixed order:
//!
//! 1. `driver` is derived from `pid == "1"`.
//! 2. The identity is `stop_id` followed by `pid`.
//! 3. Every boolean schema field present as a column is read with [`parse_truthiness`].
//! 4. The six address fragments compose `address_description`.
//! 5. `date_stop` and `time_stop` combine into `stop_datetime`.
//! 6. Duration, service call flag, assignment and city are renamed and coerced.
//! 7. The gender indicators are reconciled by [`normalize_gender_identity`].
//! 8. Values merge with increasing precedence: pass-through columns, stage 6 values, stage 1
//!    and 3 booleans, then the stage 7 identity.
//! 9. Anything the schema does not declare is dropped.
//!
//! The record is only borrowed; every stage reads from it and none writes back.

use chrono_tz::Tz;

use crate::conversions::address::{AddressFragments, compose_address};
use crate::conversions::bool::parse_truthiness;
use crate::conversions::datetime::{DEFAULT_TIMEZONE, combine_date_time, parse_timezone};
use crate::conversions::gender::{NONCONFORMING_GENDER_CODE, normalize_gender_identity};
use crate::conversions::numeric::parse_integer;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::schema::{FieldKind, FieldSchema, STOP_SCHEMA, Schema, fields};
use crate::types::{Cell, DocumentId, RawRecord, StopDocument};

/// Source column names read by the transformer.
pub mod columns {
    pub const PID: &str = "pid";
    pub const STOP_ID: &str = "stop_id";
    pub const DATE_STOP: &str = "date_stop";
    pub const TIME_STOP: &str = "time_stop";
    pub const STOP_DURATION: &str = "stopduration";
    pub const STOP_IN_RESPONSE_TO_CFS: &str = "stop_in_response_to_cfs";
    pub const ASSIGNMENT: &str = "assignment";
    pub const ADDRESS_CITY: &str = "address_city";
    pub const INTERSECTION: &str = "intersection";
    pub const ADDRESS_BLOCK: &str = "address_block";
    pub const LAND_MARK: &str = "land_mark";
    pub const ADDRESS_STREET: &str = "address_street";
    pub const HIGHWAY_EXIT: &str = "highway_exit";
    pub const SCHOOL_NAME: &str = "school_name";
    pub const GEND_NC: &str = "gend_nc";
    pub const GENDER_NONCONFORMING: &str = "gender_nonconforming";
    pub const GEND: &str = "gend";
    pub const PERCEIVED_GENDER: &str = "perceived_gender";
    pub const PERCEIVED_LGBT: &str = "perceived_lgbt";
    pub const EXP_YEARS: &str = "exp_years";
    pub const PERCEIVED_AGE: &str = "perceived_age";
    pub const BEAT: &str = "beat";
    pub const PERCEIVED_LIMITED_ENGLISH: &str = "perceived_limited_english";

    /// Columns every source row must carry.
    pub const REQUIRED: &[&str] = &[
        PID,
        STOP_ID,
        DATE_STOP,
        TIME_STOP,
        STOP_DURATION,
        STOP_IN_RESPONSE_TO_CFS,
        ASSIGNMENT,
        ADDRESS_CITY,
        INTERSECTION,
        ADDRESS_BLOCK,
        LAND_MARK,
        ADDRESS_STREET,
        HIGHWAY_EXIT,
        SCHOOL_NAME,
        GEND_NC,
        GENDER_NONCONFORMING,
        GEND,
        PERCEIVED_GENDER,
        PERCEIVED_LGBT,
        EXP_YEARS,
        PERCEIVED_AGE,
        BEAT,
        PERCEIVED_LIMITED_ENGLISH,
    ];
}

/// Schema fields copied from the column of the same name, converted by their declared kind.
const PASSTHROUGH_FIELDS: &[&str] = &[
    fields::PID,
    fields::STOP_ID,
    fields::EXP_YEARS,
    fields::PERCEIVED_AGE,
    fields::BEAT,
    fields::PERCEIVED_LIMITED_ENGLISH,
];

/// Pure row transformer for the stop schema.
#[derive(Debug, Clone, Copy)]
pub struct RowTransformer {
    schema: Schema,
    timezone: Tz,
}

impl RowTransformer {
    pub fn new(timezone: Tz) -> Self {
        Self {
            schema: STOP_SCHEMA,
            timezone,
        }
    }

    /// Creates a transformer for an IANA timezone name.
    pub fn from_timezone_name(name: &str) -> EtlResult<Self> {
        Ok(Self::new(parse_timezone(name)?))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Produces the canonical document of `record`.
    ///
    /// Fails with [`ErrorKind::SchemaViolation`] when a required column is missing and with
    /// [`ErrorKind::ConversionError`] when a date, time or number is malformed.
    pub fn transform(&self, record: &RawRecord) -> EtlResult<StopDocument> {
        // Stage 1 reads `pid` before anything else can claim it.
        let pid = record.required(columns::PID)?;
        let mut boolean_entries = vec![(fields::DRIVER, Cell::Bool(pid == "1"))];

        let id = DocumentId::new(record.required(columns::STOP_ID)?, pid);

        for field in self.schema.fields_of_kind(FieldKind::Boolean) {
            if let Some(raw) = record.get(field.name) {
                boolean_entries.push((field.name, parse_truthiness(raw).into()));
            }
        }

        let address_description = compose_address(&AddressFragments {
            intersection: record.required(columns::INTERSECTION)?,
            land_mark: record.required(columns::LAND_MARK)?,
            school_name: record.required(columns::SCHOOL_NAME)?,
            address_block: record.required(columns::ADDRESS_BLOCK)?,
            address_street: record.required(columns::ADDRESS_STREET)?,
            highway_exit: record.required(columns::HIGHWAY_EXIT)?,
        })?;

        let stop_datetime = combine_date_time(
            record.required(columns::DATE_STOP)?,
            record.required(columns::TIME_STOP)?,
            self.timezone,
        )?;

        let derived = [
            (
                fields::ADDRESS_DESCRIPTION,
                Cell::String(address_description),
            ),
            (fields::STOP_DATETIME, Cell::TimestampTz(stop_datetime)),
            (
                fields::STOP_DURATION_MINUTES,
                parse_integer(
                    columns::STOP_DURATION,
                    record.required(columns::STOP_DURATION)?,
                )?
                .into(),
            ),
            (
                fields::RESPONSE_TO_SERVICE_CALL,
                Cell::Bool(
                    parse_truthiness(record.required(columns::STOP_IN_RESPONSE_TO_CFS)?).is_set(),
                ),
            ),
            (
                fields::OFFICER_ASSIGNMENT,
                Cell::String(record.required(columns::ASSIGNMENT)?.to_string()),
            ),
            (
                fields::CITY,
                Cell::String(record.required(columns::ADDRESS_CITY)?.to_string()),
            ),
        ];

        let nonconforming = parse_truthiness(record.required(columns::GEND_NC)?).is_present()
            || parse_truthiness(record.required(columns::GENDER_NONCONFORMING)?).is_present()
            || record.required(columns::GEND)?.trim() == NONCONFORMING_GENDER_CODE;
        let identity = normalize_gender_identity(
            record.required(columns::PERCEIVED_GENDER)?,
            nonconforming,
            parse_truthiness(record.required(columns::PERCEIVED_LGBT)?).is_set(),
        );

        let mut document = StopDocument::builder(id, &self.schema);

        for name in PASSTHROUGH_FIELDS {
            let field = self.declared(name)?;
            let cell = convert_by_kind(field, record.required(field.name)?)?;
            document.set(field.name, cell);
        }
        for (name, cell) in derived {
            document.set(name, cell);
        }
        for (name, cell) in boolean_entries {
            document.set(name, cell);
        }
        document
            .set(
                fields::PERCEIVED_GENDER,
                Cell::String(identity.perceived_gender),
            )
            .set(
                fields::PERCEIVED_TRANSGENDER,
                Cell::Bool(identity.perceived_transgender),
            )
            .set(
                fields::PERCEIVED_LGBTQIA,
                Cell::Bool(identity.perceived_lgbtqia),
            );

        Ok(document.build())
    }

    fn declared(&self, name: &str) -> EtlResult<&'static FieldSchema> {
        self.schema.field(name).ok_or_else(|| {
            etl_error!(
                ErrorKind::InvalidState,
                "Pass-through field is not declared by the schema",
                format!("field `{name}`")
            )
        })
    }
}

impl Default for RowTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

fn convert_by_kind(field: &FieldSchema, raw: &str) -> EtlResult<Cell> {
    match field.kind {
        FieldKind::Keyword | FieldKind::Text => Ok(Cell::String(raw.to_string())),
        FieldKind::Integer => Ok(parse_integer(field.name, raw)?.into()),
        FieldKind::Boolean => Ok(parse_truthiness(raw).into()),
        FieldKind::Date => Err(etl_error!(
            ErrorKind::InvalidState,
            "Date fields cannot be copied from a single column",
            format!("field `{}`", field.name)
        )),
    }
}
