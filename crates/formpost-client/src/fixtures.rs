//! Test-data population
//!
//! A [`FixtureProvider`] produces one [`FixtureValue`] per field;
//! [`populate_fields`] applies them to a form the way a user would fill it
//! in. Providers are passed in explicitly, so tests can swap a random
//! provider for a fixed one.

use formpost_forms::{FormDocument, InputKind};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A value to put into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureValue {
	Text(String),
	Flag(bool),
	/// Per-option check state for radio and checkbox groups, keyed by value
	Choices(IndexMap<String, bool>),
}

impl FixtureValue {
	/// Truthiness used for a single checkbox.
	fn is_truthy(&self) -> bool {
		match self {
			FixtureValue::Text(text) => !text.is_empty(),
			FixtureValue::Flag(flag) => *flag,
			FixtureValue::Choices(choices) => choices.values().any(|checked| *checked),
		}
	}

	/// Whether an option carrying `value` should be checked.
	fn selects(&self, value: &str) -> bool {
		match self {
			FixtureValue::Text(text) => text == value,
			FixtureValue::Flag(_) => false,
			FixtureValue::Choices(choices) => choices.get(value).copied().unwrap_or(false),
		}
	}

	fn as_text(&self) -> String {
		match self {
			FixtureValue::Text(text) => text.clone(),
			FixtureValue::Flag(flag) => flag.to_string(),
			FixtureValue::Choices(choices) => choices
				.iter()
				.find(|(_, checked)| **checked)
				.map(|(value, _)| value.clone())
				.unwrap_or_default(),
		}
	}
}

impl From<&str> for FixtureValue {
	fn from(text: &str) -> Self {
		FixtureValue::Text(text.to_string())
	}
}

impl From<String> for FixtureValue {
	fn from(text: String) -> Self {
		FixtureValue::Text(text)
	}
}

impl From<bool> for FixtureValue {
	fn from(flag: bool) -> Self {
		FixtureValue::Flag(flag)
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateOptions {
	/// Give every optional field a value instead of sometimes leaving it empty
	pub no_empty: bool,
}

pub trait FixtureProvider {
	/// Values keyed by field name or element id.
	fn fixtures(&mut self, options: PopulateOptions) -> IndexMap<String, FixtureValue>;
}

/// A fixed set of values.
#[derive(Debug, Clone, Default)]
pub struct StaticFixtures(pub IndexMap<String, FixtureValue>);

impl StaticFixtures {
	pub fn with(mut self, field: impl Into<String>, value: impl Into<FixtureValue>) -> Self {
		self.0.insert(field.into(), value.into());
		self
	}
}

impl FixtureProvider for StaticFixtures {
	fn fixtures(&mut self, _options: PopulateOptions) -> IndexMap<String, FixtureValue> {
		self.0.clone()
	}
}

/// What [`populate_fields`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
	pub populated: Vec<String>,
	/// Fields the provider named that the form does not have
	pub missing: Vec<String>,
}

/// Apply `provider`'s values to `form`.
///
/// Elements match a field by id or by name. Radios are checked when their
/// value is selected, checkboxes follow the value's truthiness (or their own
/// entry when given [`FixtureValue::Choices`]), selects take the value and
/// fire their change handlers, everything else takes the value as text.
/// File inputs are left alone.
pub fn populate_fields(
	form: &mut FormDocument,
	provider: &mut dyn FixtureProvider,
	options: PopulateOptions,
) -> PopulateReport {
	let mut report = PopulateReport::default();

	for (field, value) in provider.fixtures(options) {
		let mut changes = Vec::new();
		let mut matched = false;

		for element in form.elements_mut() {
			let by_id = element.id.as_deref() == Some(field.as_str());
			let by_name = element.field_name() == Some(field.as_str());
			if !by_id && !by_name {
				continue;
			}
			matched = true;

			match element.kind {
				InputKind::Radio => element.checked = value.selects(&element.value),
				InputKind::Checkbox => {
					element.checked = match &value {
						FixtureValue::Choices(_) => value.selects(&element.value),
						other => other.is_truthy(),
					}
				}
				InputKind::Select => {
					if let Some(name) = element.field_name() {
						changes.push(name.to_string());
					}
					element.value = value.as_text();
				}
				InputKind::File => {}
				_ => element.value = value.as_text(),
			}
		}

		for name in changes {
			form.change(&name, value.as_text());
		}

		if matched {
			report.populated.push(field);
		} else {
			tracing::warn!(field = %field, "field not found");
			report.missing.push(field);
		}
	}

	tracing::info!(
		populated = report.populated.len(),
		no_empty = options.no_empty,
		"form populated with test data"
	);
	report
}

fn put(data: &mut IndexMap<String, FixtureValue>, name: &str, value: FixtureValue) {
	data.insert(name.to_string(), value);
}

const FIRST_NAMES: &[&str] = &["Emma", "Liam", "Olivia", "Noah", "Ava"];
const LAST_NAMES: &[&str] = &["Smith", "Johnson", "Williams", "Brown", "Jones"];
const CITIES: &[&str] = &["London", "Paris", "Berlin", "Madrid", "Rome"];
const COUNTRIES: &[&str] = &[
	"United States",
	"United Kingdom",
	"France",
	"Germany",
	"Japan",
];
const STREETS: &[&str] = &["Main", "Oak", "Pine", "Maple", "Cedar"];
const INSTITUTES: &[&str] = &["Harvard", "Oxford", "Pasteur", "Max Planck", "Tokyo"];
const DEPARTMENTS: &[&str] = &["Cardiology", "Genetics", "Biomedicine", "Molecular Biology"];
const COMMENTS: &[&str] = &[
	"Special dietary requirements",
	"Accessibility needs",
	"Additional information",
];

/// Random conference-registration data.
#[derive(Debug, Clone)]
pub struct RegistrationFixtures {
	rng: StdRng,
	/// Chance an optional field is left empty when `no_empty` is off
	empty_chance: f64,
}

impl Default for RegistrationFixtures {
	fn default() -> Self {
		Self::new()
	}
}

impl RegistrationFixtures {
	pub fn new() -> Self {
		Self::from_rng(StdRng::from_entropy())
	}

	/// Reproducible data for a given seed.
	pub fn seeded(seed: u64) -> Self {
		Self::from_rng(StdRng::seed_from_u64(seed))
	}

	fn from_rng(rng: StdRng) -> Self {
		Self {
			rng,
			empty_chance: 0.3,
		}
	}

	fn pick(&mut self, options: &[&str]) -> String {
		options
			.choose(&mut self.rng)
			.map(|s| s.to_string())
			.unwrap_or_default()
	}

	fn maybe_empty(&mut self, options: PopulateOptions, value: String) -> FixtureValue {
		if options.no_empty || !self.rng.gen_bool(self.empty_chance) {
			FixtureValue::Text(value)
		} else {
			FixtureValue::Text(String::new())
		}
	}

	fn choices(&mut self, options: &[(&str, f64)]) -> FixtureValue {
		FixtureValue::Choices(
			options
				.iter()
				.map(|(value, threshold)| (value.to_string(), self.rng.gen_bool(1.0 - threshold)))
				.collect(),
		)
	}
}

impl FixtureProvider for RegistrationFixtures {
	fn fixtures(&mut self, options: PopulateOptions) -> IndexMap<String, FixtureValue> {
		let mut data = IndexMap::new();

		let esc_id = self.rng.gen_range(100_000..1_000_000).to_string();
		put(&mut data, "person-esc-id", esc_id.into());
		let title = self.choices(&[
			("Professor", 0.7),
			("Assoc. Professor Doctor", 0.7),
			("Mr", 0.8),
			("Mrs", 0.8),
			("Miss", 0.8),
			("Mx", 0.9),
		]);
		put(&mut data, "person-title", title);
		let first = self.pick(FIRST_NAMES);
		put(&mut data, "person-first-name", first.into());
		let last = self.pick(LAST_NAMES);
		put(&mut data, "person-last-name", last.into());
		let email = format!("test{}@example.com", self.rng.gen_range(0..1000));
		put(&mut data, "person-email", email.into());
		let mobile = format!(
			"+{}{}",
			[1, 33, 44, 49, 61][self.rng.gen_range(0..5)],
			self.rng.gen_range(100_000_000..1_000_000_000u64)
		);
		put(&mut data, "person-mobile", mobile.into());
		let dob = format!(
			"{}-{:02}-{:02}",
			self.rng.gen_range(1950..2000),
			self.rng.gen_range(1..=12),
			self.rng.gen_range(1..=28)
		);
		put(&mut data, "person-dob", dob.into());
		let gender = self.pick(&["Male", "Female", "X"]);
		put(&mut data, "person-gender", gender.into());

		let street = self.pick(STREETS);
		let address = format!("{} {} St", self.rng.gen_range(10..100), street);
		put(&mut data, "address", address.into());
		let city = self.pick(CITIES);
		put(&mut data, "address-city", city.into());
		let postcode = self.rng.gen_range(10_000..100_000).to_string();
		put(&mut data, "address-postcode", postcode.into());
		let state = self.pick(&["County", "Province", "State"]);
		let state = self.maybe_empty(options, state);
		put(&mut data, "address-state", state);
		let country = self.pick(COUNTRIES);
		put(&mut data, "address-country", country.into());

		let institute = format!("{} University", self.pick(INSTITUTES));
		put(&mut data, "prof-institute", institute.into());
		let department = format!("Department of {}", self.pick(DEPARTMENTS));
		let department = self.maybe_empty(options, department);
		put(&mut data, "prof-department", department);

		let registration = self.choices(&[
			("Early fee: Non-member", 0.5),
			("Early fee: Council member", 0.7),
			("Late fee: Non-member", 0.5),
			("Late fee: Council member", 0.7),
		]);
		put(&mut data, "registration", registration);
		let workshops = self.choices(&[("Workshop 1", 0.5), ("Workshop 2", 0.5)]);
		put(&mut data, "workshops", workshops);
		let comment = self.pick(COMMENTS);
		let comment = self.maybe_empty(options, comment);
		put(&mut data, "comments", comment);
		put(&mut data, "terms", FixtureValue::Flag(true));

		data
	}
}
