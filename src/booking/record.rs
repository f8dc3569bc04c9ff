use serde::{Deserialize, Serialize};
use std::fmt;

/// The six fields the call has to collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingField {
    PickupLocation,
    DropLocation,
    VehicleType,
    BodyType,
    GoodsType,
    TripDate,
}

impl BookingField {
    pub const ALL: [BookingField; 6] = [
        BookingField::PickupLocation,
        BookingField::DropLocation,
        BookingField::VehicleType,
        BookingField::BodyType,
        BookingField::GoodsType,
        BookingField::TripDate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BookingField::PickupLocation => "pickup_location",
            BookingField::DropLocation => "drop_location",
            BookingField::VehicleType => "vehicle_type",
            BookingField::BodyType => "body_type",
            BookingField::GoodsType => "goods_type",
            BookingField::TripDate => "trip_date",
        }
    }

    /// Human label, used for missing-field prompts and the summary
    pub fn label(self) -> &'static str {
        match self {
            BookingField::PickupLocation => "Pickup Location (City / Area / Full Address)",
            BookingField::DropLocation => "Drop Location",
            BookingField::VehicleType => "Vehicle Type (Truck or specific vehicle model)",
            BookingField::BodyType => "Body Type (Open or Container)",
            BookingField::GoodsType => "Goods/Material Type (e.g., cement, FMCG, machinery)",
            BookingField::TripDate => "Trip Date (Required date of the trip)",
        }
    }
}

impl fmt::Display for BookingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    #[default]
    Pending,
    Confirmed,
    NotInterested,
}

impl ConfirmationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationStatus::Pending => "pending",
            ConfirmationStatus::Confirmed => "confirmed",
            ConfirmationStatus::NotInterested => "not_interested",
        }
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much weight a proposed value carries against an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    /// Echo of parsed understanding ("pickup A, drop B"); always replaces
    Confirmation,
    /// Free-form mention; replaces only a strictly shorter value
    Refinement,
    /// Set-once fields; ignored when a value exists
    FirstMention,
}

/// A proposed change to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: BookingField,
    pub value: String,
    pub source: UpdateSource,
}

impl FieldUpdate {
    pub fn new(field: BookingField, value: impl Into<String>, source: UpdateSource) -> Self {
        Self {
            field,
            value: value.into(),
            source,
        }
    }
}

/// Fixed identity of the customer being called
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerIdentity {
    pub name: String,
    pub contact: String,
}

impl Default for CustomerIdentity {
    fn default() -> Self {
        Self {
            name: "Lokesh".to_string(),
            contact: "9066542031".to_string(),
        }
    }
}

/// Booking data collected over one call
///
/// Fields only move forward: a set value is never cleared, and the
/// confirmation status leaves `pending` at most once through keywords.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pickup_location: Option<String>,
    drop_location: Option<String>,
    vehicle_type: Option<String>,
    body_type: Option<String>,
    goods_type: Option<String>,
    trip_date: Option<String>,
    confirmation_status: ConfirmationStatus,
}

impl BookingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: BookingField) -> Option<&str> {
        match field {
            BookingField::PickupLocation => self.pickup_location.as_deref(),
            BookingField::DropLocation => self.drop_location.as_deref(),
            BookingField::VehicleType => self.vehicle_type.as_deref(),
            BookingField::BodyType => self.body_type.as_deref(),
            BookingField::GoodsType => self.goods_type.as_deref(),
            BookingField::TripDate => self.trip_date.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: BookingField) -> &mut Option<String> {
        match field {
            BookingField::PickupLocation => &mut self.pickup_location,
            BookingField::DropLocation => &mut self.drop_location,
            BookingField::VehicleType => &mut self.vehicle_type,
            BookingField::BodyType => &mut self.body_type,
            BookingField::GoodsType => &mut self.goods_type,
            BookingField::TripDate => &mut self.trip_date,
        }
    }

    pub fn is_set(&self, field: BookingField) -> bool {
        self.get(field).is_some()
    }

    pub fn pickup_location(&self) -> Option<&str> {
        self.get(BookingField::PickupLocation)
    }

    pub fn drop_location(&self) -> Option<&str> {
        self.get(BookingField::DropLocation)
    }

    pub fn vehicle_type(&self) -> Option<&str> {
        self.get(BookingField::VehicleType)
    }

    pub fn body_type(&self) -> Option<&str> {
        self.get(BookingField::BodyType)
    }

    pub fn goods_type(&self) -> Option<&str> {
        self.get(BookingField::GoodsType)
    }

    pub fn trip_date(&self) -> Option<&str> {
        self.get(BookingField::TripDate)
    }

    pub fn confirmation_status(&self) -> ConfirmationStatus {
        self.confirmation_status
    }

    /// Apply a proposed update. Returns true if the stored value changed.
    pub fn apply(&mut self, update: &FieldUpdate) -> bool {
        let value = update.value.trim();
        if value.is_empty() {
            return false;
        }

        let slot = self.slot_mut(update.field);
        let replace = match (slot.as_deref(), update.source) {
            (None, _) => true,
            (Some(current), _) if current == value => false,
            (Some(_), UpdateSource::Confirmation) => true,
            (Some(current), UpdateSource::Refinement) => {
                value.chars().count() > current.chars().count()
            }
            (Some(_), UpdateSource::FirstMention) => false,
        };

        if replace {
            *slot = Some(value.to_string());
        }
        replace
    }

    /// Leave `pending` for `status`. No-op once the status is settled.
    pub fn settle_status(&mut self, status: ConfirmationStatus) -> bool {
        if self.confirmation_status != ConfirmationStatus::Pending
            || status == ConfirmationStatus::Pending
        {
            return false;
        }
        self.confirmation_status = status;
        true
    }

    /// Mark confirmed regardless of the current status
    pub fn force_confirmed(&mut self) -> bool {
        if self.confirmation_status == ConfirmationStatus::Confirmed {
            return false;
        }
        self.confirmation_status = ConfirmationStatus::Confirmed;
        true
    }

    /// Labels of required fields that are still unset
    pub fn missing_fields(&self) -> Vec<&'static str> {
        BookingField::ALL
            .iter()
            .filter(|field| !self.is_set(**field))
            .map(|field| field.label())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        BookingField::ALL.iter().all(|field| self.is_set(*field))
    }

    /// Flat payload for the booking endpoint
    pub fn to_submission(&self, customer: &CustomerIdentity) -> BookingSubmission {
        let text = |field| self.get(field).unwrap_or_default().to_string();

        BookingSubmission {
            name: customer.name.clone(),
            contact: customer.contact.clone(),
            pickup_location: text(BookingField::PickupLocation),
            drop_location: text(BookingField::DropLocation),
            truck_type: text(BookingField::VehicleType),
            body_type: text(BookingField::BodyType),
            material: text(BookingField::GoodsType),
            required_date: text(BookingField::TripDate),
        }
    }
}

impl fmt::Display for BookingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "DROPTRUCK BOOKING INFORMATION")?;
        writeln!(f, "{}", rule)?;
        for field in BookingField::ALL {
            let title = field.label().split(" (").next().unwrap_or_default();
            writeln!(
                f,
                "{:.<30} {}",
                title,
                self.get(field).unwrap_or("[NOT PROVIDED]")
            )?;
        }
        writeln!(f, "{:.<30} {}", "Confirmation Status", self.confirmation_status)?;
        write!(f, "{}", rule)
    }
}

/// Booking as posted to the submission endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSubmission {
    pub name: String,
    pub contact: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub truck_type: String,
    pub body_type: String,
    pub material: String,
    pub required_date: String,
}
