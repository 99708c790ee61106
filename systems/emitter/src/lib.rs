#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Record emitter.
//!
//! Flattens samples, denial events, category shares and license quantities
//! into [`Record`] values carrying every field the fixture serializer expects.
//! Reference fields are resolved against the [`ReferenceData`] repository,
//! identifiers are drawn from the injected random source and every timestamp
//! comes from one captured [`EmissionClock`]. Nothing here performs I/O.

use rand::Rng;
use samgen_core::{
    format_date, ConfigurationError, DenialEvent, EmissionClock, FieldValue, LookupError,
    Record, RecordKind, RecordToken, Run, Sample, SampleShares, TableKind,
};
use samgen_reference::{columns, query, ReferenceData, Row};

/// Source tag stamped on every record.
pub const SOURCE: &str = "OpeniT";
/// Account recorded as creator and last updater.
pub const ADMIN: &str = "admin";
/// Domain path stamped on every record.
pub const DOMAIN_PATH: &str = "/";
/// Version reported by every denial record.
pub const DENIAL_VERSION: &str = "2020";
/// Number of discovery models that receive a license record.
pub const LICENSED_MODELS: usize = 3;

const UNKNOWN_VERSION: &str = "Unknown";

/// Records produced by one emitter call together with the items it skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Emission {
    records: Vec<Record>,
    warnings: Vec<LookupError>,
}

impl Emission {
    /// Emitted records in input order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Lookup failures whose records were skipped.
    #[must_use]
    pub fn warnings(&self) -> &[LookupError] {
        &self.warnings
    }

    /// Splits the emission into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Record>, Vec<LookupError>) {
        (self.records, self.warnings)
    }

    fn push(&mut self, outcome: Result<Record, LookupError>) {
        match outcome {
            Ok(record) => self.records.push(record),
            Err(warning) => self.warnings.push(warning),
        }
    }
}

/// Maps generated data into flat records.
#[derive(Clone, Debug)]
pub struct Emitter<'a> {
    reference: &'a ReferenceData,
    clock: EmissionClock,
    license_column: String,
}

impl<'a> Emitter<'a> {
    /// Creates an emitter reading from `reference` and stamping `clock`.
    #[must_use]
    pub fn new(reference: &'a ReferenceData, clock: EmissionClock) -> Self {
        Self {
            reference,
            clock,
            license_column: columns::LICENSE_SYS_ID.to_owned(),
        }
    }

    /// Reads the license identifier of usage records from another discovery column.
    #[must_use]
    pub fn with_license_column(mut self, column: impl Into<String>) -> Self {
        self.license_column = column.into();
        self
    }

    /// Emits the concurrent usage records of a run.
    ///
    /// A fanned-out run yields one record per sample and category, resolved by
    /// normalized product; any other run yields one record per sample against
    /// a randomly chosen discovery model.
    pub fn usage_records<R: Rng + ?Sized>(
        &self,
        run: &Run,
        rng: &mut R,
    ) -> Result<Emission, ConfigurationError> {
        let mut emission = Emission::default();
        match run.fanout() {
            Some(fanout) => {
                for sample_shares in fanout {
                    self.emit_shares(sample_shares, &mut emission, rng)?;
                }
            }
            None => {
                for (index, sample) in run.samples().iter().enumerate() {
                    let discovery = query::choose(self.reference, TableKind::Discovery, rng)?;
                    emission.push(self.usage_record(index, sample, discovery, rng));
                }
            }
        }
        Ok(emission)
    }

    fn emit_shares<R: Rng + ?Sized>(
        &self,
        sample_shares: &SampleShares,
        emission: &mut Emission,
        rng: &mut R,
    ) -> Result<(), ConfigurationError> {
        for share in sample_shares.shares() {
            let discovery = match query::discovery_for(self.reference, share.category())? {
                Ok(row) => row,
                Err(warning) => {
                    emission.warnings.push(warning);
                    continue;
                }
            };
            let sample = UsagePoint {
                number: sample_shares.sample_index() + 1,
                date: format_date(sample_shares.date()),
                quantity: share.quantity(),
            };
            emission.push(self.usage_fields(&sample, discovery, rng));
        }
        Ok(())
    }

    fn usage_record<R: Rng + ?Sized>(
        &self,
        index: usize,
        sample: &Sample,
        discovery: &Row,
        rng: &mut R,
    ) -> Result<Record, LookupError> {
        let point = UsagePoint {
            number: index + 1,
            date: format_date(sample.date()),
            quantity: sample.level(),
        };
        self.usage_fields(&point, discovery, rng)
    }

    fn usage_fields<R: Rng + ?Sized>(
        &self,
        point: &UsagePoint,
        discovery: &Row,
        rng: &mut R,
    ) -> Result<Record, LookupError> {
        let record = Record::new(RecordKind::Usage)
            .with(
                "conc_usage_id",
                FieldValue::text(format!("Con Usage {}", point.number)),
            )
            .with("concurrent_usage", FieldValue::text(point.quantity.to_string()))
            .with(
                "license",
                FieldValue::reference(
                    discovery.require(columns::NORM_PRODUCT)?,
                    discovery.require(&self.license_column)?,
                ),
            )
            .with("source", FieldValue::text(SOURCE));
        Ok(self
            .system_fields(record, rng)
            .with("usage_date", FieldValue::text(point.date.as_str())))
    }

    /// Emits one denial record per event, each against freshly drawn reference rows.
    pub fn denial_records<R: Rng + ?Sized>(
        &self,
        denials: &[DenialEvent],
        rng: &mut R,
    ) -> Result<Emission, ConfigurationError> {
        let mut emission = Emission::default();
        for event in denials {
            let rows = DenialRows {
                discovery: query::choose(self.reference, TableKind::Discovery, rng)?,
                user: query::choose(self.reference, TableKind::User, rng)?,
                group: query::choose(self.reference, TableKind::Group, rng)?,
                license_server: query::choose(self.reference, TableKind::LicenseServer, rng)?,
                license_type: query::choose(self.reference, TableKind::LicenseType, rng)?,
            };
            emission.push(self.denial_record(event, &rows, rng));
        }
        Ok(emission)
    }

    fn denial_record<R: Rng + ?Sized>(
        &self,
        event: &DenialEvent,
        rows: &DenialRows<'_>,
        rng: &mut R,
    ) -> Result<Record, LookupError> {
        let DenialRows {
            discovery,
            user,
            group,
            license_server,
            license_type,
        } = rows;

        let record = Record::new(RecordKind::Denial)
            .with("additional_key", FieldValue::Empty)
            .with(
                "computer",
                reference(user, columns::COMPUTER_NAME, columns::COMPUTER_SYS_ID)?,
            )
            .with("denial_date", FieldValue::text(format_date(event.date())))
            .with(
                "denial_id",
                FieldValue::text(format!("Denial {}", event.sample_index() + 1)),
            )
            .with(
                "discovery_model",
                reference(discovery, columns::DISCOVERY_MODEL, columns::DISCOVERY_SYS_ID)?,
            )
            .with("group", reference(group, columns::GROUP, columns::GROUP_SYS_ID)?)
            .with("is_product_normalized", FieldValue::text("true"))
            .with(
                "last_denial_time",
                FieldValue::text(self.clock.minute_timestamp()),
            )
            .with(
                "license_server",
                reference(
                    license_server,
                    columns::LICENSE_SERVER,
                    columns::LICENSE_SERVER_SYS_ID,
                )?,
            )
            .with(
                "license_type",
                reference(
                    license_type,
                    columns::LICENSE_TYPE,
                    columns::LICENSE_TYPE_SYS_ID,
                )?,
            )
            .with(
                "norm_product",
                reference(discovery, columns::NORM_PRODUCT, columns::NORM_PRODUCT_SYS_ID)?,
            )
            .with(
                "norm_publisher",
                reference(
                    discovery,
                    columns::NORM_PUBLISHER,
                    columns::NORM_PUBLISHER_SYS_ID,
                )?,
            )
            .with("product", FieldValue::text(discovery.require(columns::PRODUCT)?))
            .with(
                "publisher",
                FieldValue::text(discovery.require(columns::PUBLISHER)?),
            )
            .with("source", FieldValue::text(SOURCE));

        Ok(self
            .system_fields(record, rng)
            .with(
                "total_denial_count",
                FieldValue::text(event.magnitude().to_string()),
            )
            .with("user", reference(user, columns::USER, columns::USER_SYS_ID)?)
            .with("version", FieldValue::text(DENIAL_VERSION))
            .with(
                "workstation",
                reference(user, columns::WORKSTATION, columns::WORKSTATION_SYS_ID)?,
            ))
    }

    /// Emits one license record per quantity, paired in order with the leading
    /// [`LICENSED_MODELS`] discovery models.
    ///
    /// Quantities beyond the number of available models are dropped.
    pub fn license_records<R: Rng + ?Sized>(
        &self,
        quantities: &[u32],
        rng: &mut R,
    ) -> Result<Emission, ConfigurationError> {
        let models = query::leading_discovery(self.reference, LICENSED_MODELS)?;
        let mut emission = Emission::default();
        for (discovery, quantity) in models.iter().zip(quantities) {
            let license_server = query::choose(self.reference, TableKind::LicenseServer, rng)?;
            let license_type = query::choose(self.reference, TableKind::LicenseType, rng)?;
            emission.push(self.license_record(
                discovery,
                license_server,
                license_type,
                *quantity,
                rng,
            ));
        }
        Ok(emission)
    }

    fn license_record<R: Rng + ?Sized>(
        &self,
        discovery: &Row,
        license_server: &Row,
        license_type: &Row,
        quantity: u32,
        rng: &mut R,
    ) -> Result<Record, LookupError> {
        let version = normalize_version(discovery.get(columns::VERSION).unwrap_or(UNKNOWN_VERSION));
        let record = Record::new(RecordKind::License)
            .with("active", FieldValue::text("true"))
            .with("end_date", FieldValue::text(self.clock.license_end_timestamp()))
            .with(
                "eng_software_install",
                reference(
                    discovery,
                    columns::SOFTWARE_INSTALL,
                    columns::SOFTWARE_INSTALL_SYS_ID,
                )?,
            )
            .with("is_product_normalized", FieldValue::text("true"))
            .with("license_id", FieldValue::text(token(rng)))
            .with(
                "license_server",
                reference(
                    license_server,
                    columns::LICENSE_SERVER,
                    columns::LICENSE_SERVER_SYS_ID,
                )?,
            )
            .with(
                "license_type",
                reference(
                    license_type,
                    columns::LICENSE_TYPE,
                    columns::LICENSE_TYPE_SYS_ID,
                )?,
            )
            .with(
                "norm_product",
                reference(discovery, columns::NORM_PRODUCT, columns::NORM_PRODUCT_SYS_ID)?,
            )
            .with(
                "norm_publisher",
                reference(
                    discovery,
                    columns::NORM_PUBLISHER,
                    columns::NORM_PUBLISHER_SYS_ID,
                )?,
            )
            .with("parent_id", FieldValue::Empty)
            .with("product", FieldValue::text(discovery.require(columns::PRODUCT)?))
            .with(
                "publisher",
                FieldValue::text(discovery.require(columns::PUBLISHER)?),
            )
            .with("quantity", FieldValue::text(quantity.to_string()))
            .with("source", FieldValue::text(SOURCE))
            .with("start_date", FieldValue::text(self.clock.timestamp()));

        Ok(self
            .system_fields(record, rng)
            .with("version", FieldValue::text(version)))
    }

    /// Appends the audit block shared by every record kind.
    fn system_fields<R: Rng + ?Sized>(&self, record: Record, rng: &mut R) -> Record {
        let stamp = self.clock.timestamp();
        record
            .with("sys_created_by", FieldValue::text(ADMIN))
            .with("sys_created_on", FieldValue::text(stamp.as_str()))
            .with("sys_domain", FieldValue::text(token(rng)))
            .with("sys_domain_path", FieldValue::text(DOMAIN_PATH))
            .with("sys_id", FieldValue::text(token(rng)))
            .with(
                "sys_mod_count",
                FieldValue::text(rng.gen_range(1..=100u32).to_string()),
            )
            .with("sys_updated_by", FieldValue::text(ADMIN))
            .with("sys_updated_on", FieldValue::text(stamp))
    }
}

struct UsagePoint {
    number: usize,
    date: String,
    quantity: u32,
}

struct DenialRows<'a> {
    discovery: &'a Row,
    user: &'a Row,
    group: &'a Row,
    license_server: &'a Row,
    license_type: &'a Row,
}

fn reference(row: &Row, display: &str, sys_id: &str) -> Result<FieldValue, LookupError> {
    Ok(FieldValue::reference(row.require(display)?, row.require(sys_id)?))
}

fn token<R: Rng + ?Sized>(rng: &mut R) -> String {
    RecordToken::new(rng.gen::<u128>()).to_string()
}

/// Drops the fractional part of whole-number versions, so `2020.0` becomes `2020`.
///
/// Anything that is not a finite whole number is returned unchanged.
#[must_use]
pub fn normalize_version(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", value as i64)
        }
        _ => raw.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use samgen_reference::fixtures;

    fn clock() -> EmissionClock {
        EmissionClock::new(
            NaiveDate::from_ymd_opt(2024, 5, 17)
                .expect("date")
                .and_time(NaiveTime::from_hms_opt(9, 30, 0).expect("time")),
        )
    }

    fn text<'r>(record: &'r Record, name: &str) -> Option<&'r str> {
        record.field(name).and_then(FieldValue::content)
    }

    #[test]
    fn versions_normalize_whole_numbers_only() {
        assert_eq!(normalize_version("2020.0"), "2020");
        assert_eq!(normalize_version("2021"), "2021");
        assert_eq!(normalize_version("10.8"), "10.8");
        assert_eq!(normalize_version("R2023b"), "R2023b");
        assert_eq!(normalize_version("NaN"), "NaN");
    }

    #[test]
    fn license_records_pair_quantities_with_leading_models() {
        let data = fixtures::reference_data();
        let emitter = Emitter::new(&data, clock());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let emission = emitter
            .license_records(&[2, 3, 4, 5], &mut rng)
            .expect("records");
        let records = emission.records();

        assert_eq!(records.len(), 3);
        assert!(emission.warnings().is_empty());
        assert_eq!(text(&records[0], "quantity"), Some("2"));
        assert_eq!(text(&records[0], "version"), Some("2020"));
        assert_eq!(text(&records[1], "version"), Some("10.8"));
        assert_eq!(text(&records[2], "product"), Some(fixtures::PRODUCTS[2]));
        assert_eq!(text(&records[0], "end_date"), Some("2034-05-17 09:30:00"));
        assert_eq!(text(&records[0], "start_date"), Some("2024-05-17 09:30:00"));
        assert_eq!(records[0].field("parent_id"), Some(&FieldValue::Empty));
        assert_eq!(
            records[0].field("norm_product"),
            Some(&FieldValue::reference(fixtures::PRODUCTS[0], "np-1"))
        );
    }

    #[test]
    fn system_block_is_well_formed() {
        let data = fixtures::reference_data();
        let emitter = Emitter::new(&data, clock());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let emission = emitter.license_records(&[7], &mut rng).expect("records");
        let record = &emission.records()[0];

        let sys_id = text(record, "sys_id").expect("sys_id");
        assert_eq!(sys_id.len(), 32);
        assert!(sys_id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(Some(sys_id), text(record, "sys_domain"));

        let mod_count: u32 = text(record, "sys_mod_count")
            .expect("mod count")
            .parse()
            .expect("number");
        assert!((1..=100).contains(&mod_count));
        assert_eq!(text(record, "sys_created_on"), text(record, "sys_updated_on"));
        assert_eq!(text(record, "sys_domain_path"), Some("/"));
        assert_eq!(text(record, "sys_created_by"), Some("admin"));
    }

    #[test]
    fn missing_columns_skip_the_record_with_a_warning() {
        let base = fixtures::reference_data();
        let broken = Row::new(TableKind::Discovery, [(columns::NORM_PRODUCT, "Bare")]);
        let data = ReferenceData::from_tables(
            TableKind::ALL
                .iter()
                .map(|kind| {
                    let rows = if *kind == TableKind::Discovery {
                        vec![broken.clone()]
                    } else {
                        query::table(&base, *kind).expect("fixture table").to_vec()
                    };
                    (*kind, rows)
                })
                .collect::<Vec<_>>(),
        );
        let emitter = Emitter::new(&data, clock());
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let emission = emitter.license_records(&[4], &mut rng).expect("emission");
        assert!(emission.records().is_empty());
        assert!(matches!(
            emission.warnings(),
            [LookupError::MissingColumn { table: TableKind::Discovery, .. }]
        ));
    }

    #[test]
    fn unloaded_reference_is_a_configuration_error() {
        let data = ReferenceData::new();
        let emitter = Emitter::new(&data, clock());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            emitter.license_records(&[1, 2, 3], &mut rng),
            Err(ConfigurationError::ReferenceNotLoaded)
        );
    }
}
