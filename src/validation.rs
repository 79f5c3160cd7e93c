//! Step validators.
//!
//! Each validator takes the raw JSON body of a step submission and either
//! returns the typed [`StepData`] for that step or a [`ValidationError`]
//! naming the first violated rule. Validators never touch the database.

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{NaiveDate, Utc};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::errors::{ErrorCode, ValidationError};
use crate::models::{
    AssetsInfo, DocumentMetadata, DocumentsInfo, EmploymentDuration, EmploymentInfo,
    EmploymentType, ExpensesInfo, LoanRequest, PersonalInfo, ResidencyStatus, Step, StepData,
};

type Payload = Map<String, Value>;

pub const MIN_LOAN_AMOUNT: i64 = 100;
pub const MAX_LOAN_AMOUNT: i64 = 2000;
pub const MAX_RENT: i64 = 10_000;
pub const MAX_MONTHLY_EXPENSES: i64 = 20_000;
pub const MAX_DEBTS: i64 = 500_000;
pub const MAX_DEPENDENTS: i64 = 10;
/// Largest whole amount a `NUMERIC(12, 2)` income column holds.
pub const MAX_INCOME_AMOUNT: i64 = 9_999_999_999;
/// Largest whole amount a `NUMERIC(14, 2)` savings or assets column holds.
pub const MAX_HOLDINGS_AMOUNT: i64 = 999_999_999_999;

// Amounts written with a wider exponent than this are not money.
const MAX_EXPONENT: i64 = 32;

// RFC 5322 simplified: local@domain.tld
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// Validates the body submitted for `step`.
pub fn validate_step(step: Step, payload: &Value) -> Result<StepData, ValidationError> {
    let map = match payload {
        Value::Null => return Err(ValidationError::new(ErrorCode::NoData, "No data provided")),
        Value::Object(map) if map.is_empty() => {
            return Err(ValidationError::new(ErrorCode::NoData, "No data provided"))
        }
        Value::Object(map) => map,
        _ => {
            return Err(ValidationError::new(
                ErrorCode::InvalidJson,
                "Request body must be a JSON object",
            ))
        }
    };

    match step {
        Step::PersonalInfo => validate_personal_info(map).map(StepData::PersonalInfo),
        Step::Employment => validate_employment(map).map(StepData::Employment),
        Step::Expenses => validate_expenses(map).map(StepData::Expenses),
        Step::Assets => validate_assets(map).map(StepData::Assets),
        Step::LoanRequest => validate_loan_request(map).map(StepData::LoanRequest),
        Step::Documents => validate_documents(map).map(StepData::Documents),
    }
}

/// Step 1: personal information.
pub fn validate_personal_info(map: &Payload) -> Result<PersonalInfo, ValidationError> {
    require_text(
        map,
        &[
            "fullName",
            "dob",
            "address",
            "email",
            "phoneNumber",
            "nzResidencyStatus",
        ],
    )?;

    let residency_status = text(map, "nzResidencyStatus")
        .and_then(|s| ResidencyStatus::from_str(&s).ok())
        .ok_or_else(|| {
            ValidationError::with_fields(
                ErrorCode::InvalidResidencyStatus,
                "Invalid residency status",
                vec!["nzResidencyStatus".to_string()],
            )
        })?;

    let date_of_birth = text(map, "dob")
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
        .filter(|d| *d <= Utc::now().date_naive())
        .ok_or_else(|| {
            ValidationError::with_fields(
                ErrorCode::InvalidDateOfBirth,
                "Date of birth must be a past date in YYYY-MM-DD format",
                vec!["dob".to_string()],
            )
        })?;

    let email = text(map, "email").unwrap_or_default();
    if !is_valid_email(&email) {
        return Err(ValidationError::with_fields(
            ErrorCode::InvalidEmail,
            "Invalid email address",
            vec!["email".to_string()],
        ));
    }

    let phone_number = normalize_phone(&text(map, "phoneNumber").unwrap_or_default())
        .ok_or_else(|| {
            ValidationError::with_fields(
                ErrorCode::InvalidPhoneNumber,
                "Invalid phone number",
                vec!["phoneNumber".to_string()],
            )
        })?;

    Ok(PersonalInfo {
        full_name: text(map, "fullName").unwrap_or_default(),
        date_of_birth,
        address: text(map, "address").unwrap_or_default(),
        email,
        phone_number,
        residency_status,
        tax_number: text(map, "taxNumber"),
    })
}

/// Step 2: employment and income.
pub fn validate_employment(map: &Payload) -> Result<EmploymentInfo, ValidationError> {
    require_text(map, &["employmentType"])?;

    let employment_type = text(map, "employmentType")
        .and_then(|s| EmploymentType::from_str(&s).ok())
        .ok_or_else(|| {
            ValidationError::with_fields(
                ErrorCode::InvalidEmploymentType,
                "Invalid employment type",
                vec!["employmentType".to_string()],
            )
        })?;

    let employment_duration = match text(map, "employmentDuration") {
        Some(raw) => Some(EmploymentDuration::from_str(&raw).map_err(|_| {
            ValidationError::with_fields(
                ErrorCode::InvalidEmploymentDuration,
                "Invalid employment duration",
                vec!["employmentDuration".to_string()],
            )
        })?),
        None => None,
    };

    let monthly_income = optional_amount(map, "monthlyIncome", MAX_INCOME_AMOUNT, ErrorCode::InvalidIncomeAmount)?;
    let other_income = optional_amount(map, "otherIncome", MAX_INCOME_AMOUNT, ErrorCode::InvalidIncomeAmount)?
        .unwrap_or_else(|| BigDecimal::from(0));

    let employer = text(map, "employer");
    let job_title = text(map, "jobTitle");
    let zero = BigDecimal::from(0);

    if employment_type.requires_employer() {
        let mut missing = Vec::new();
        if employer.is_none() {
            missing.push("employer");
        }
        if job_title.is_none() {
            missing.push("jobTitle");
        }
        if employment_duration.is_none() {
            missing.push("employmentDuration");
        }
        if !monthly_income.as_ref().is_some_and(|m| *m > zero) {
            missing.push("monthlyIncome");
        }
        if !missing.is_empty() {
            return Err(ValidationError::with_fields(
                ErrorCode::MissingEmploymentDetails,
                format!(
                    "Employment details required for {}: {}",
                    employment_type.as_str(),
                    missing.join(", ")
                ),
                missing.into_iter().map(String::from).collect(),
            ));
        }
    } else {
        let has_income = monthly_income.as_ref().is_some_and(|m| *m > zero) || other_income > zero;
        if !has_income {
            return Err(ValidationError::with_fields(
                ErrorCode::NoIncomeSpecified,
                "Please specify your income source",
                vec!["monthlyIncome".to_string(), "otherIncome".to_string()],
            ));
        }
    }

    Ok(EmploymentInfo {
        employment_type,
        employer,
        job_title,
        employment_duration,
        monthly_income,
        other_income,
    })
}

/// Step 3: expenses. All four values are required; zero counts as provided.
pub fn validate_expenses(map: &Payload) -> Result<ExpensesInfo, ValidationError> {
    let required = ["rent", "monthlyExpenses", "debts", "dependents"];
    let missing: Vec<String> = required
        .iter()
        .filter(|key| !is_present(map, key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(missing_fields(missing));
    }

    let rent = bounded_amount(map, "rent", MAX_RENT, ErrorCode::InvalidRentAmount)?;
    let monthly_expenses = bounded_amount(
        map,
        "monthlyExpenses",
        MAX_MONTHLY_EXPENSES,
        ErrorCode::InvalidExpensesAmount,
    )?;
    let debts = bounded_amount(map, "debts", MAX_DEBTS, ErrorCode::InvalidDebtsAmount)?;

    let dependents_value = &map["dependents"];
    let dependents = match integer(dependents_value) {
        Some(n) if (0..=MAX_DEPENDENTS).contains(&n) => n as i32,
        Some(_) => return Err(dependents_error()),
        None if decimal(dependents_value).is_some() => return Err(dependents_error()),
        None => return Err(not_numeric("dependents")),
    };

    Ok(ExpensesInfo {
        rent,
        monthly_expenses,
        debts,
        dependents,
    })
}

/// Step 4: assets. Nothing is required; absent values are stored as null.
pub fn validate_assets(map: &Payload) -> Result<AssetsInfo, ValidationError> {
    let savings = optional_amount(map, "savings", MAX_HOLDINGS_AMOUNT, ErrorCode::InvalidSavingsAmount)?;
    let assets = optional_amount(map, "assets", MAX_HOLDINGS_AMOUNT, ErrorCode::InvalidAssetsAmount)?;

    let is_politically_exposed = match map.get("isPoliticallyExposed") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(ValidationError::with_fields(
                ErrorCode::InvalidPoliticalExposureFlag,
                "isPoliticallyExposed must be true or false",
                vec!["isPoliticallyExposed".to_string()],
            ))
        }
    };

    Ok(AssetsInfo {
        savings,
        assets,
        source_of_funds: text(map, "sourceOfFunds"),
        expected_account_activity: text(map, "expectedAccountActivity"),
        is_politically_exposed,
    })
}

/// Step 5: loan request and the three mandatory declarations.
pub fn validate_loan_request(map: &Payload) -> Result<LoanRequest, ValidationError> {
    require_text(map, &["loanAmount", "loanPurpose"])?;

    let loan_amount = map
        .get("loanAmount")
        .and_then(decimal)
        .map(cents)
        .filter(|amount| {
            *amount >= BigDecimal::from(MIN_LOAN_AMOUNT) && *amount <= BigDecimal::from(MAX_LOAN_AMOUNT)
        })
        .ok_or_else(|| {
            ValidationError::with_fields(
                ErrorCode::InvalidLoanAmount,
                format!(
                    "Loan amount must be between ${} and ${}",
                    MIN_LOAN_AMOUNT, MAX_LOAN_AMOUNT
                ),
                vec!["loanAmount".to_string()],
            )
        })?;

    let declarations = ["understandsTerms", "canAffordRepayments", "hasReceivedAdvice"];
    let unconfirmed: Vec<String> = declarations
        .iter()
        .filter(|key| map.get(**key) != Some(&Value::Bool(true)))
        .map(|key| key.to_string())
        .collect();
    if !unconfirmed.is_empty() {
        return Err(ValidationError::with_fields(
            ErrorCode::MissingDeclarations,
            "All declarations must be confirmed",
            unconfirmed,
        ));
    }

    Ok(LoanRequest {
        loan_amount,
        loan_purpose: text(map, "loanPurpose").unwrap_or_default(),
        loan_term: text(map, "loanTerm"),
        understands_terms: true,
        can_afford_repayments: true,
        has_received_advice: true,
    })
}

const DOCUMENT_KINDS: [&str; 3] = ["identityDocument", "addressProof", "incomeProof"];

/// Step 6: metadata for the three required documents.
pub fn validate_documents(map: &Payload) -> Result<DocumentsInfo, ValidationError> {
    let mut missing = Vec::new();
    for kind in DOCUMENT_KINDS {
        for suffix in ["Name", "Size", "Type"] {
            let key = format!("{}{}", kind, suffix);
            let provided = if suffix == "Size" {
                is_present(map, &key)
            } else {
                text(map, &key).is_some()
            };
            if !provided {
                missing.push(key);
            }
        }
    }
    if !missing.is_empty() {
        return Err(missing_fields(missing));
    }

    let document = |kind: &str| -> Result<DocumentMetadata, ValidationError> {
        let size_key = format!("{}Size", kind);
        let size = integer(&map[&size_key])
            .filter(|size| *size >= 0)
            .ok_or_else(|| {
                ValidationError::with_fields(
                    ErrorCode::InvalidDocumentSize,
                    format!("{} must be a non-negative whole number of bytes", size_key),
                    vec![size_key.clone()],
                )
            })?;
        Ok(DocumentMetadata {
            name: text(map, &format!("{}Name", kind)).unwrap_or_default(),
            size,
            mime_type: text(map, &format!("{}Type", kind)).unwrap_or_default(),
        })
    };

    Ok(DocumentsInfo {
        identity_document: document("identityDocument")?,
        address_proof: document("addressProof")?,
        income_proof: document("incomeProof")?,
    })
}

/// Checks an email address against a simplified RFC 5322 pattern.
pub fn is_valid_email(email: &str) -> bool {
    email.len() >= 5 && EMAIL_REGEX.is_match(email)
}

/// Parses a phone number (New Zealand by default) and formats it as E.164.
pub fn normalize_phone(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    match phonenumber::parse(Some(CountryId::NZ), raw) {
        Ok(number) if phonenumber::is_valid(&number) => {
            Some(number.format().mode(Mode::E164).to_string())
        }
        Ok(_) => {
            tracing::debug!("Rejected phone number (not valid): {}", raw);
            None
        }
        Err(e) => {
            tracing::debug!("Failed to parse phone number '{}': {:?}", raw, e);
            None
        }
    }
}

// ============ Field helpers ============

/// Non-empty text value. Numbers are accepted and rendered as text.
fn text(map: &Payload, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Present means "not null", so zero and `false` count.
fn is_present(map: &Payload, key: &str) -> bool {
    !matches!(map.get(key), None | Some(Value::Null))
}

fn decimal(value: &Value) -> Option<BigDecimal> {
    let parsed = match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }?;
    let (_, exponent) = parsed.as_bigint_and_exponent();
    (exponent.abs() <= MAX_EXPONENT).then_some(parsed)
}

/// Rounds to whole cents, the scale of every money column.
fn cents(amount: BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn require_text(map: &Payload, keys: &[&str]) -> Result<(), ValidationError> {
    let missing: Vec<String> = keys
        .iter()
        .filter(|key| text(map, key).is_none())
        .map(|key| key.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing_fields(missing))
    }
}

fn missing_fields(fields: Vec<String>) -> ValidationError {
    ValidationError::with_fields(
        ErrorCode::MissingRequiredFields,
        format!("Missing required fields: {}", fields.join(", ")),
        fields,
    )
}

fn not_numeric(key: &str) -> ValidationError {
    ValidationError::with_fields(
        ErrorCode::InvalidNumericValue,
        format!("{} must be a number", key),
        vec![key.to_string()],
    )
}

fn dependents_error() -> ValidationError {
    ValidationError::with_fields(
        ErrorCode::InvalidDependentsCount,
        format!("Dependents must be a whole number between 0 and {}", MAX_DEPENDENTS),
        vec!["dependents".to_string()],
    )
}

/// A required amount in `[0, max]`.
fn bounded_amount(
    map: &Payload,
    key: &str,
    max: i64,
    code: ErrorCode,
) -> Result<BigDecimal, ValidationError> {
    let amount = map
        .get(key)
        .and_then(decimal)
        .map(cents)
        .ok_or_else(|| not_numeric(key))?;
    if amount < BigDecimal::from(0) || amount > BigDecimal::from(max) {
        return Err(ValidationError::with_fields(
            code,
            format!("{} must be between 0 and {}", key, max),
            vec![key.to_string()],
        ));
    }
    Ok(amount)
}

/// An optional amount in `[0, max]`. Null, absent and empty string all mean "not given".
fn optional_amount(
    map: &Payload,
    key: &str,
    max: i64,
    code: ErrorCode,
) -> Result<Option<BigDecimal>, ValidationError> {
    let value = match map.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(value) => value,
    };

    match decimal(value).map(cents) {
        Some(amount) if amount >= BigDecimal::from(0) && amount <= BigDecimal::from(max) => {
            Ok(Some(amount))
        }
        _ => Err(ValidationError::with_fields(
            code,
            format!("{} must be a number between 0 and {}", key, max),
            vec![key.to_string()],
        )),
    }
}
