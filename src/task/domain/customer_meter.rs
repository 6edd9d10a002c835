//! Denormalized customer meter record synthesized from form reports.

use super::{CustomerId, ReportPayload, SubTaskKind, SubTaskReport, TaskDomainError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Meter fields common to both construction stages that carry meter data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterIdentity {
    /// Meter appliance type identifier.
    pub meter_id: i64,
    /// Meter brand.
    pub meter_brand: String,
    /// Meter serial number.
    pub sn_meter: String,
    /// Meter size class identifier.
    pub g_size_id: i64,
}

impl MeterIdentity {
    fn parse(payload: &ReportPayload) -> Result<Self, TaskDomainError> {
        Ok(Self {
            meter_id: payload.require_i64("meter_id")?,
            meter_brand: payload.require_str("meter_brand")?.to_owned(),
            sn_meter: payload.require_str("sn_meter")?.to_owned(),
            g_size_id: payload.require_i64("g_size_id")?,
        })
    }
}

/// Partial update of a customer meter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CustomerMeterPatch {
    /// Data from a meter installation form report.
    MeterInstallation {
        /// Meter identity.
        meter: MeterIdentity,
        /// Minimum flow rate.
        qmin: f64,
        /// Maximum flow rate.
        qmax: f64,
        /// Month the calibration started.
        start_calibration_month: i64,
        /// Year the calibration started.
        start_calibration_year: i64,
        /// Time of the form report.
        register_timestamp: DateTime<Utc>,
    },
    /// Data from a gas-in form report.
    GasIn {
        /// Meter identity.
        meter: MeterIdentity,
        /// Meter location longitude.
        meter_location_longitude: f64,
        /// Meter location latitude.
        meter_location_latitude: f64,
        /// Date gas was first supplied.
        gas_in_date: NaiveDate,
    },
}

impl CustomerMeterPatch {
    /// Extracts the patch carried by a form report of the given sub-task kind.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoMeterData`] for kinds that carry no meter
    /// data, or a field error when the payload lacks a required field.
    pub fn from_form_report(
        kind: SubTaskKind,
        report: &SubTaskReport,
    ) -> Result<Self, TaskDomainError> {
        let payload = &report.payload;
        match kind {
            SubTaskKind::ConstructionMeterInstallation => Ok(Self::MeterInstallation {
                meter: MeterIdentity::parse(payload)?,
                qmin: payload.require_f64("qmin")?,
                qmax: payload.require_f64("qmax")?,
                start_calibration_month: payload.require_i64("start_calibration_month")?,
                start_calibration_year: payload.require_i64("start_calibration_year")?,
                register_timestamp: report.at,
            }),
            SubTaskKind::ConstructionGasIn => Ok(Self::GasIn {
                meter: MeterIdentity::parse(payload)?,
                meter_location_longitude: payload.require_f64("meter_location_longitude")?,
                meter_location_latitude: payload.require_f64("meter_location_latitude")?,
                gas_in_date: payload.require_date("gas_in_date")?,
            }),
            other => Err(TaskDomainError::NoMeterData(other.full_code().to_owned())),
        }
    }
}

/// Customer meter record, keyed by customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerMeter {
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Meter appliance type identifier.
    pub meter_id: Option<i64>,
    /// Meter brand.
    pub meter_brand: Option<String>,
    /// Meter serial number.
    pub sn_meter: Option<String>,
    /// Meter size class identifier.
    pub g_size_id: Option<i64>,
    /// Minimum flow rate.
    pub qmin: Option<f64>,
    /// Maximum flow rate.
    pub qmax: Option<f64>,
    /// Month the calibration started.
    pub start_calibration_month: Option<i64>,
    /// Year the calibration started.
    pub start_calibration_year: Option<i64>,
    /// Time the meter installation was reported.
    pub register_timestamp: Option<DateTime<Utc>>,
    /// Meter location longitude.
    pub meter_location_longitude: Option<f64>,
    /// Meter location latitude.
    pub meter_location_latitude: Option<f64>,
    /// Date gas was first supplied.
    pub gas_in_date: Option<NaiveDate>,
}

impl CustomerMeter {
    /// Creates an empty record for a customer.
    #[must_use]
    pub const fn empty(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            meter_id: None,
            meter_brand: None,
            sn_meter: None,
            g_size_id: None,
            qmin: None,
            qmax: None,
            start_calibration_month: None,
            start_calibration_year: None,
            register_timestamp: None,
            meter_location_longitude: None,
            meter_location_latitude: None,
            gas_in_date: None,
        }
    }

    /// Merges a patch, leaving fields the patch does not carry untouched.
    pub fn apply(&mut self, patch: &CustomerMeterPatch) {
        match patch {
            CustomerMeterPatch::MeterInstallation {
                meter,
                qmin,
                qmax,
                start_calibration_month,
                start_calibration_year,
                register_timestamp,
            } => {
                self.apply_identity(meter);
                self.qmin = Some(*qmin);
                self.qmax = Some(*qmax);
                self.start_calibration_month = Some(*start_calibration_month);
                self.start_calibration_year = Some(*start_calibration_year);
                self.register_timestamp = Some(*register_timestamp);
            }
            CustomerMeterPatch::GasIn {
                meter,
                meter_location_longitude,
                meter_location_latitude,
                gas_in_date,
            } => {
                self.apply_identity(meter);
                self.meter_location_longitude = Some(*meter_location_longitude);
                self.meter_location_latitude = Some(*meter_location_latitude);
                self.gas_in_date = Some(*gas_in_date);
            }
        }
    }

    fn apply_identity(&mut self, meter: &MeterIdentity) {
        self.meter_id = Some(meter.meter_id);
        self.meter_brand = Some(meter.meter_brand.clone());
        self.sn_meter = Some(meter.sn_meter.clone());
        self.g_size_id = Some(meter.g_size_id);
    }
}
