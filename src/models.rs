use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ErrorCode;

// ============ Wizard Steps ============

/// The six wizard steps, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    PersonalInfo = 1,
    Employment = 2,
    Expenses = 3,
    Assets = 4,
    LoanRequest = 5,
    Documents = 6,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::PersonalInfo,
        Step::Employment,
        Step::Expenses,
        Step::Assets,
        Step::LoanRequest,
        Step::Documents,
    ];

    /// 1-based step index, as stored in `step_completed`.
    pub fn number(self) -> i32 {
        self as i32
    }

    pub fn from_number(n: i32) -> Option<Step> {
        Self::ALL.iter().copied().find(|s| s.number() == n)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}", self.number())
    }
}

// ============ Enumerated Field Values ============

/// New Zealand residency status (step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidencyStatus {
    Citizen,
    PermanentResident,
    TemporaryResident,
    WorkVisa,
    StudentVisa,
}

impl ResidencyStatus {
    pub const ALL: [ResidencyStatus; 5] = [
        ResidencyStatus::Citizen,
        ResidencyStatus::PermanentResident,
        ResidencyStatus::TemporaryResident,
        ResidencyStatus::WorkVisa,
        ResidencyStatus::StudentVisa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResidencyStatus::Citizen => "citizen",
            ResidencyStatus::PermanentResident => "permanent_resident",
            ResidencyStatus::TemporaryResident => "temporary_resident",
            ResidencyStatus::WorkVisa => "work_visa",
            ResidencyStatus::StudentVisa => "student_visa",
        }
    }
}

impl FromStr for ResidencyStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s).ok_or(())
    }
}

/// Employment type (step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    SelfEmployed,
    Contractor,
    Casual,
    Student,
    Unemployed,
    Retired,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 8] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::SelfEmployed,
        EmploymentType::Contractor,
        EmploymentType::Casual,
        EmploymentType::Student,
        EmploymentType::Unemployed,
        EmploymentType::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::SelfEmployed => "self_employed",
            EmploymentType::Contractor => "contractor",
            EmploymentType::Casual => "casual",
            EmploymentType::Student => "student",
            EmploymentType::Unemployed => "unemployed",
            EmploymentType::Retired => "retired",
        }
    }

    /// Unemployed and retired applicants have no employer details to give.
    pub fn requires_employer(&self) -> bool {
        !matches!(self, EmploymentType::Unemployed | EmploymentType::Retired)
    }
}

impl FromStr for EmploymentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s).ok_or(())
    }
}

/// Time with the current employer (step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmploymentDuration {
    #[serde(rename = "less_than_3_months")]
    LessThan3Months,
    #[serde(rename = "3_to_6_months")]
    ThreeToSixMonths,
    #[serde(rename = "6_to_12_months")]
    SixToTwelveMonths,
    #[serde(rename = "1_to_2_years")]
    OneToTwoYears,
    #[serde(rename = "2_to_5_years")]
    TwoToFiveYears,
    #[serde(rename = "more_than_5_years")]
    MoreThan5Years,
}

impl EmploymentDuration {
    pub const ALL: [EmploymentDuration; 6] = [
        EmploymentDuration::LessThan3Months,
        EmploymentDuration::ThreeToSixMonths,
        EmploymentDuration::SixToTwelveMonths,
        EmploymentDuration::OneToTwoYears,
        EmploymentDuration::TwoToFiveYears,
        EmploymentDuration::MoreThan5Years,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentDuration::LessThan3Months => "less_than_3_months",
            EmploymentDuration::ThreeToSixMonths => "3_to_6_months",
            EmploymentDuration::SixToTwelveMonths => "6_to_12_months",
            EmploymentDuration::OneToTwoYears => "1_to_2_years",
            EmploymentDuration::TwoToFiveYears => "2_to_5_years",
            EmploymentDuration::MoreThan5Years => "more_than_5_years",
        }
    }
}

impl FromStr for EmploymentDuration {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s).ok_or(())
    }
}

// ============ Validated Step Payloads ============

/// Step 1: personal information.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalInfo {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub email: String,
    /// E.164 formatted.
    pub phone_number: String,
    pub residency_status: ResidencyStatus,
    pub tax_number: Option<String>,
}

/// Step 2: employment and income.
#[derive(Debug, Clone, PartialEq)]
pub struct EmploymentInfo {
    pub employment_type: EmploymentType,
    pub employer: Option<String>,
    pub job_title: Option<String>,
    pub employment_duration: Option<EmploymentDuration>,
    pub monthly_income: Option<BigDecimal>,
    pub other_income: BigDecimal,
}

/// Step 3: monthly expenses and obligations.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpensesInfo {
    pub rent: BigDecimal,
    pub monthly_expenses: BigDecimal,
    pub debts: BigDecimal,
    pub dependents: i32,
}

/// Step 4: assets and financial profile.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetsInfo {
    pub savings: Option<BigDecimal>,
    pub assets: Option<BigDecimal>,
    pub source_of_funds: Option<String>,
    pub expected_account_activity: Option<String>,
    pub is_politically_exposed: bool,
}

/// Step 5: loan request and declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub loan_amount: BigDecimal,
    pub loan_purpose: String,
    pub loan_term: Option<String>,
    pub understands_terms: bool,
    pub can_afford_repayments: bool,
    pub has_received_advice: bool,
}

/// Metadata for one uploaded document. The file body never reaches this service.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub name: String,
    pub size: i64,
    pub mime_type: String,
}

/// Step 6: documents.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentsInfo {
    pub identity_document: DocumentMetadata,
    pub address_proof: DocumentMetadata,
    pub income_proof: DocumentMetadata,
}

/// A validated payload for exactly one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepData {
    PersonalInfo(PersonalInfo),
    Employment(EmploymentInfo),
    Expenses(ExpensesInfo),
    Assets(AssetsInfo),
    LoanRequest(LoanRequest),
    Documents(DocumentsInfo),
}

impl StepData {
    pub fn step(&self) -> Step {
        match self {
            StepData::PersonalInfo(_) => Step::PersonalInfo,
            StepData::Employment(_) => Step::Employment,
            StepData::Expenses(_) => Step::Expenses,
            StepData::Assets(_) => Step::Assets,
            StepData::LoanRequest(_) => Step::LoanRequest,
            StepData::Documents(_) => Step::Documents,
        }
    }

    /// Merges this step into `record` the way the upsert statement does:
    /// only this step's columns change, `step_completed` only grows, and
    /// step 6 marks the application complete.
    pub fn apply_to(&self, record: &mut ApplicantRecord, now: DateTime<Utc>) {
        match self {
            StepData::PersonalInfo(p) => {
                record.full_name = Some(p.full_name.clone());
                record.date_of_birth = Some(p.date_of_birth);
                record.address = Some(p.address.clone());
                record.email = Some(p.email.clone());
                record.phone_number = Some(p.phone_number.clone());
                record.nz_residency_status = Some(p.residency_status.as_str().to_string());
                record.tax_number = p.tax_number.clone();
            }
            StepData::Employment(e) => {
                record.employment_type = Some(e.employment_type.as_str().to_string());
                record.employer = e.employer.clone();
                record.job_title = e.job_title.clone();
                record.employment_duration =
                    e.employment_duration.map(|d| d.as_str().to_string());
                record.monthly_income = e.monthly_income.clone();
                record.other_income = Some(e.other_income.clone());
            }
            StepData::Expenses(x) => {
                record.rent = Some(x.rent.clone());
                record.monthly_expenses = Some(x.monthly_expenses.clone());
                record.debts = Some(x.debts.clone());
                record.dependents = Some(x.dependents);
            }
            StepData::Assets(a) => {
                record.savings = a.savings.clone();
                record.assets = a.assets.clone();
                record.source_of_funds = a.source_of_funds.clone();
                record.expected_account_activity = a.expected_account_activity.clone();
                record.is_politically_exposed = Some(a.is_politically_exposed);
            }
            StepData::LoanRequest(l) => {
                record.loan_amount = Some(l.loan_amount.clone());
                record.loan_purpose = Some(l.loan_purpose.clone());
                record.loan_term = l.loan_term.clone();
                record.understands_terms = Some(l.understands_terms);
                record.can_afford_repayments = Some(l.can_afford_repayments);
                record.has_received_advice = Some(l.has_received_advice);
            }
            StepData::Documents(d) => {
                record.identity_document_name = Some(d.identity_document.name.clone());
                record.identity_document_size = Some(d.identity_document.size);
                record.identity_document_type = Some(d.identity_document.mime_type.clone());
                record.identity_document_uploaded_at = Some(now);
                record.address_proof_name = Some(d.address_proof.name.clone());
                record.address_proof_size = Some(d.address_proof.size);
                record.address_proof_type = Some(d.address_proof.mime_type.clone());
                record.address_proof_uploaded_at = Some(now);
                record.income_proof_name = Some(d.income_proof.name.clone());
                record.income_proof_size = Some(d.income_proof.size);
                record.income_proof_type = Some(d.income_proof.mime_type.clone());
                record.income_proof_uploaded_at = Some(now);
                record.is_completed = true;
            }
        }

        record.step_completed = record.step_completed.max(self.step().number());
        record.updated_at = now;
    }
}

// ============ Database Models ============

/// One applicant's onboarding application (`onboarding_applications` row).
///
/// Every step's columns stay `NULL` until that step is first saved.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantRecord {
    pub id: Uuid,
    /// Subject identifier issued by the identity provider.
    pub firebase_uid: String,

    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub nz_residency_status: Option<String>,
    pub tax_number: Option<String>,

    pub employment_type: Option<String>,
    pub employer: Option<String>,
    pub job_title: Option<String>,
    pub employment_duration: Option<String>,
    pub monthly_income: Option<BigDecimal>,
    pub other_income: Option<BigDecimal>,

    pub rent: Option<BigDecimal>,
    pub monthly_expenses: Option<BigDecimal>,
    pub debts: Option<BigDecimal>,
    pub dependents: Option<i32>,

    pub savings: Option<BigDecimal>,
    pub assets: Option<BigDecimal>,
    pub source_of_funds: Option<String>,
    pub expected_account_activity: Option<String>,
    pub is_politically_exposed: Option<bool>,

    pub loan_amount: Option<BigDecimal>,
    pub loan_purpose: Option<String>,
    pub loan_term: Option<String>,
    pub understands_terms: Option<bool>,
    pub can_afford_repayments: Option<bool>,
    pub has_received_advice: Option<bool>,

    pub identity_document_name: Option<String>,
    pub identity_document_size: Option<i64>,
    pub identity_document_type: Option<String>,
    pub identity_document_uploaded_at: Option<DateTime<Utc>>,
    pub address_proof_name: Option<String>,
    pub address_proof_size: Option<i64>,
    pub address_proof_type: Option<String>,
    pub address_proof_uploaded_at: Option<DateTime<Utc>>,
    pub income_proof_name: Option<String>,
    pub income_proof_size: Option<i64>,
    pub income_proof_type: Option<String>,
    pub income_proof_uploaded_at: Option<DateTime<Utc>>,

    /// Highest step ever saved. Never decreases.
    pub step_completed: i32,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicantRecord {
    /// A fresh row with the same column defaults as the table definition.
    pub fn new(firebase_uid: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            firebase_uid: firebase_uid.to_string(),
            full_name: None,
            date_of_birth: None,
            address: None,
            email: None,
            phone_number: None,
            nz_residency_status: None,
            tax_number: None,
            employment_type: None,
            employer: None,
            job_title: None,
            employment_duration: None,
            monthly_income: None,
            other_income: Some(BigDecimal::from(0)),
            rent: None,
            monthly_expenses: None,
            debts: None,
            dependents: None,
            savings: None,
            assets: None,
            source_of_funds: None,
            expected_account_activity: None,
            is_politically_exposed: Some(false),
            loan_amount: None,
            loan_purpose: None,
            loan_term: None,
            understands_terms: None,
            can_afford_repayments: None,
            has_received_advice: None,
            identity_document_name: None,
            identity_document_size: None,
            identity_document_type: None,
            identity_document_uploaded_at: None,
            address_proof_name: None,
            address_proof_size: None,
            address_proof_type: None,
            address_proof_uploaded_at: None,
            income_proof_name: None,
            income_proof_size: None,
            income_proof_type: None,
            income_proof_uploaded_at: None,
            step_completed: 0,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============ API Models ============

/// Uniform response envelope for every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error_code: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_code: Some(code),
        }
    }
}

fn money(value: &Option<BigDecimal>) -> Option<f64> {
    value.as_ref().and_then(|d| d.to_f64())
}

fn iso_date(value: &Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Step 1 as the wizard reads it back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoView {
    pub full_name: Option<String>,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub nz_residency_status: Option<String>,
    pub tax_number: Option<String>,
    pub step_completed: i32,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentView {
    pub employment_type: Option<String>,
    pub employer: Option<String>,
    pub job_title: Option<String>,
    pub employment_duration: Option<String>,
    pub monthly_income: Option<f64>,
    pub other_income: Option<f64>,
    pub step_completed: i32,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensesView {
    pub rent: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub debts: Option<f64>,
    pub dependents: Option<i32>,
    pub step_completed: i32,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsView {
    pub savings: Option<f64>,
    pub assets: Option<f64>,
    pub source_of_funds: Option<String>,
    pub expected_account_activity: Option<String>,
    pub is_politically_exposed: bool,
    pub step_completed: i32,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequestView {
    pub loan_amount: Option<f64>,
    pub loan_purpose: Option<String>,
    pub loan_term: Option<String>,
    pub understands_terms: bool,
    pub can_afford_repayments: bool,
    pub has_received_advice: bool,
    pub step_completed: i32,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsView {
    pub identity_document_name: Option<String>,
    pub identity_document_size: Option<i64>,
    pub identity_document_type: Option<String>,
    pub identity_document_uploaded_at: Option<DateTime<Utc>>,
    pub address_proof_name: Option<String>,
    pub address_proof_size: Option<i64>,
    pub address_proof_type: Option<String>,
    pub address_proof_uploaded_at: Option<DateTime<Utc>>,
    pub income_proof_name: Option<String>,
    pub income_proof_size: Option<i64>,
    pub income_proof_type: Option<String>,
    pub income_proof_uploaded_at: Option<DateTime<Utc>>,
    pub step_completed: i32,
    pub is_completed: bool,
}

impl From<&ApplicantRecord> for PersonalInfoView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            full_name: r.full_name.clone(),
            dob: iso_date(&r.date_of_birth),
            address: r.address.clone(),
            email: r.email.clone(),
            phone_number: r.phone_number.clone(),
            nz_residency_status: r.nz_residency_status.clone(),
            tax_number: r.tax_number.clone(),
            step_completed: r.step_completed,
            is_completed: r.is_completed,
        }
    }
}

impl From<&ApplicantRecord> for EmploymentView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            employment_type: r.employment_type.clone(),
            employer: r.employer.clone(),
            job_title: r.job_title.clone(),
            employment_duration: r.employment_duration.clone(),
            monthly_income: money(&r.monthly_income),
            other_income: money(&r.other_income),
            step_completed: r.step_completed,
            is_completed: r.is_completed,
        }
    }
}

impl From<&ApplicantRecord> for ExpensesView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            rent: money(&r.rent),
            monthly_expenses: money(&r.monthly_expenses),
            debts: money(&r.debts),
            dependents: r.dependents,
            step_completed: r.step_completed,
            is_completed: r.is_completed,
        }
    }
}

impl From<&ApplicantRecord> for AssetsView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            savings: money(&r.savings),
            assets: money(&r.assets),
            source_of_funds: r.source_of_funds.clone(),
            expected_account_activity: r.expected_account_activity.clone(),
            is_politically_exposed: r.is_politically_exposed.unwrap_or(false),
            step_completed: r.step_completed,
            is_completed: r.is_completed,
        }
    }
}

impl From<&ApplicantRecord> for LoanRequestView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            loan_amount: money(&r.loan_amount),
            loan_purpose: r.loan_purpose.clone(),
            loan_term: r.loan_term.clone(),
            understands_terms: r.understands_terms.unwrap_or(false),
            can_afford_repayments: r.can_afford_repayments.unwrap_or(false),
            has_received_advice: r.has_received_advice.unwrap_or(false),
            step_completed: r.step_completed,
            is_completed: r.is_completed,
        }
    }
}

impl From<&ApplicantRecord> for DocumentsView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            identity_document_name: r.identity_document_name.clone(),
            identity_document_size: r.identity_document_size,
            identity_document_type: r.identity_document_type.clone(),
            identity_document_uploaded_at: r.identity_document_uploaded_at,
            address_proof_name: r.address_proof_name.clone(),
            address_proof_size: r.address_proof_size,
            address_proof_type: r.address_proof_type.clone(),
            address_proof_uploaded_at: r.address_proof_uploaded_at,
            income_proof_name: r.income_proof_name.clone(),
            income_proof_size: r.income_proof_size,
            income_proof_type: r.income_proof_type.clone(),
            income_proof_uploaded_at: r.income_proof_uploaded_at,
            step_completed: r.step_completed,
            is_completed: r.is_completed,
        }
    }
}

/// Caller-facing shape of one step of a stored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepView {
    PersonalInfo(PersonalInfoView),
    Employment(EmploymentView),
    Expenses(ExpensesView),
    Assets(AssetsView),
    LoanRequest(LoanRequestView),
    Documents(DocumentsView),
}

impl StepView {
    pub fn from_record(step: Step, record: &ApplicantRecord) -> Self {
        match step {
            Step::PersonalInfo => StepView::PersonalInfo(record.into()),
            Step::Employment => StepView::Employment(record.into()),
            Step::Expenses => StepView::Expenses(record.into()),
            Step::Assets => StepView::Assets(record.into()),
            Step::LoanRequest => StepView::LoanRequest(record.into()),
            Step::Documents => StepView::Documents(record.into()),
        }
    }
}

/// Progress summary returned by `/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub step_completed: i32,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StatusView {
    /// Status for a subject that has never saved a step.
    pub fn not_started() -> Self {
        Self {
            step_completed: 0,
            is_completed: false,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<&ApplicantRecord> for StatusView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            step_completed: r.step_completed,
            is_completed: r.is_completed,
            created_at: Some(r.created_at),
            updated_at: Some(r.updated_at),
        }
    }
}

/// Every section of an application, for review screens.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub status: StatusView,
    pub personal_info: PersonalInfoView,
    pub employment: EmploymentView,
    pub expenses: ExpensesView,
    pub assets: AssetsView,
    pub loan_request: LoanRequestView,
    pub documents: DocumentsView,
}

impl From<&ApplicantRecord> for ApplicationView {
    fn from(r: &ApplicantRecord) -> Self {
        Self {
            status: r.into(),
            personal_info: r.into(),
            employment: r.into(),
            expenses: r.into(),
            assets: r.into(),
            loan_request: r.into(),
            documents: r.into(),
        }
    }
}
