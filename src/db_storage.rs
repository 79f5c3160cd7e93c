use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::Database;
use crate::errors::{AppError, ResultExt};
use crate::models::{ApplicantRecord, StepData};

/// Persistence seam for applicant records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts or merges one step's columns for `firebase_uid` and returns
    /// the row as it stands after the write.
    async fn upsert(&self, firebase_uid: &str, data: &StepData)
        -> Result<ApplicantRecord, AppError>;

    async fn find(&self, firebase_uid: &str) -> Result<Option<ApplicantRecord>, AppError>;
}

/// Applicant records in the `onboarding_applications` table.
pub struct PgRecordStore {
    db: Database,
}

impl PgRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

// Each statement touches only its own step's columns, so concurrent saves of
// different steps for one applicant cannot overwrite each other.
const UPSERT_PERSONAL_INFO: &str = r#"
    INSERT INTO onboarding_applications (
        firebase_uid, full_name, date_of_birth, address, email,
        phone_number, nz_residency_status, tax_number, step_completed
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (firebase_uid) DO UPDATE SET
        full_name = EXCLUDED.full_name,
        date_of_birth = EXCLUDED.date_of_birth,
        address = EXCLUDED.address,
        email = EXCLUDED.email,
        phone_number = EXCLUDED.phone_number,
        nz_residency_status = EXCLUDED.nz_residency_status,
        tax_number = EXCLUDED.tax_number,
        step_completed = GREATEST(onboarding_applications.step_completed, EXCLUDED.step_completed),
        updated_at = now()
    RETURNING *
"#;

const UPSERT_EMPLOYMENT: &str = r#"
    INSERT INTO onboarding_applications (
        firebase_uid, employment_type, employer, job_title,
        employment_duration, monthly_income, other_income, step_completed
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (firebase_uid) DO UPDATE SET
        employment_type = EXCLUDED.employment_type,
        employer = EXCLUDED.employer,
        job_title = EXCLUDED.job_title,
        employment_duration = EXCLUDED.employment_duration,
        monthly_income = EXCLUDED.monthly_income,
        other_income = EXCLUDED.other_income,
        step_completed = GREATEST(onboarding_applications.step_completed, EXCLUDED.step_completed),
        updated_at = now()
    RETURNING *
"#;

const UPSERT_EXPENSES: &str = r#"
    INSERT INTO onboarding_applications (
        firebase_uid, rent, monthly_expenses, debts, dependents, step_completed
    ) VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (firebase_uid) DO UPDATE SET
        rent = EXCLUDED.rent,
        monthly_expenses = EXCLUDED.monthly_expenses,
        debts = EXCLUDED.debts,
        dependents = EXCLUDED.dependents,
        step_completed = GREATEST(onboarding_applications.step_completed, EXCLUDED.step_completed),
        updated_at = now()
    RETURNING *
"#;

const UPSERT_ASSETS: &str = r#"
    INSERT INTO onboarding_applications (
        firebase_uid, savings, assets, source_of_funds,
        expected_account_activity, is_politically_exposed, step_completed
    ) VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (firebase_uid) DO UPDATE SET
        savings = EXCLUDED.savings,
        assets = EXCLUDED.assets,
        source_of_funds = EXCLUDED.source_of_funds,
        expected_account_activity = EXCLUDED.expected_account_activity,
        is_politically_exposed = EXCLUDED.is_politically_exposed,
        step_completed = GREATEST(onboarding_applications.step_completed, EXCLUDED.step_completed),
        updated_at = now()
    RETURNING *
"#;

const UPSERT_LOAN_REQUEST: &str = r#"
    INSERT INTO onboarding_applications (
        firebase_uid, loan_amount, loan_purpose, loan_term,
        understands_terms, can_afford_repayments, has_received_advice, step_completed
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (firebase_uid) DO UPDATE SET
        loan_amount = EXCLUDED.loan_amount,
        loan_purpose = EXCLUDED.loan_purpose,
        loan_term = EXCLUDED.loan_term,
        understands_terms = EXCLUDED.understands_terms,
        can_afford_repayments = EXCLUDED.can_afford_repayments,
        has_received_advice = EXCLUDED.has_received_advice,
        step_completed = GREATEST(onboarding_applications.step_completed, EXCLUDED.step_completed),
        updated_at = now()
    RETURNING *
"#;

const UPSERT_DOCUMENTS: &str = r#"
    INSERT INTO onboarding_applications (
        firebase_uid,
        identity_document_name, identity_document_size, identity_document_type, identity_document_uploaded_at,
        address_proof_name, address_proof_size, address_proof_type, address_proof_uploaded_at,
        income_proof_name, income_proof_size, income_proof_type, income_proof_uploaded_at,
        step_completed, is_completed
    ) VALUES ($1, $2, $3, $4, now(), $5, $6, $7, now(), $8, $9, $10, now(), $11, true)
    ON CONFLICT (firebase_uid) DO UPDATE SET
        identity_document_name = EXCLUDED.identity_document_name,
        identity_document_size = EXCLUDED.identity_document_size,
        identity_document_type = EXCLUDED.identity_document_type,
        identity_document_uploaded_at = now(),
        address_proof_name = EXCLUDED.address_proof_name,
        address_proof_size = EXCLUDED.address_proof_size,
        address_proof_type = EXCLUDED.address_proof_type,
        address_proof_uploaded_at = now(),
        income_proof_name = EXCLUDED.income_proof_name,
        income_proof_size = EXCLUDED.income_proof_size,
        income_proof_type = EXCLUDED.income_proof_type,
        income_proof_uploaded_at = now(),
        step_completed = GREATEST(onboarding_applications.step_completed, EXCLUDED.step_completed),
        is_completed = true,
        updated_at = now()
    RETURNING *
"#;

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn upsert(
        &self,
        firebase_uid: &str,
        data: &StepData,
    ) -> Result<ApplicantRecord, AppError> {
        let step = data.step();
        let mut tx = self.db.begin().await?;

        let query = match data {
            StepData::PersonalInfo(p) => sqlx::query_as::<_, ApplicantRecord>(UPSERT_PERSONAL_INFO)
                .bind(firebase_uid)
                .bind(&p.full_name)
                .bind(p.date_of_birth)
                .bind(&p.address)
                .bind(&p.email)
                .bind(&p.phone_number)
                .bind(p.residency_status.as_str())
                .bind(&p.tax_number),
            StepData::Employment(e) => sqlx::query_as::<_, ApplicantRecord>(UPSERT_EMPLOYMENT)
                .bind(firebase_uid)
                .bind(e.employment_type.as_str())
                .bind(&e.employer)
                .bind(&e.job_title)
                .bind(e.employment_duration.map(|d| d.as_str()))
                .bind(&e.monthly_income)
                .bind(&e.other_income),
            StepData::Expenses(x) => sqlx::query_as::<_, ApplicantRecord>(UPSERT_EXPENSES)
                .bind(firebase_uid)
                .bind(&x.rent)
                .bind(&x.monthly_expenses)
                .bind(&x.debts)
                .bind(x.dependents),
            StepData::Assets(a) => sqlx::query_as::<_, ApplicantRecord>(UPSERT_ASSETS)
                .bind(firebase_uid)
                .bind(&a.savings)
                .bind(&a.assets)
                .bind(&a.source_of_funds)
                .bind(&a.expected_account_activity)
                .bind(a.is_politically_exposed),
            StepData::LoanRequest(l) => sqlx::query_as::<_, ApplicantRecord>(UPSERT_LOAN_REQUEST)
                .bind(firebase_uid)
                .bind(&l.loan_amount)
                .bind(&l.loan_purpose)
                .bind(&l.loan_term)
                .bind(l.understands_terms)
                .bind(l.can_afford_repayments)
                .bind(l.has_received_advice),
            StepData::Documents(d) => sqlx::query_as::<_, ApplicantRecord>(UPSERT_DOCUMENTS)
                .bind(firebase_uid)
                .bind(&d.identity_document.name)
                .bind(d.identity_document.size)
                .bind(&d.identity_document.mime_type)
                .bind(&d.address_proof.name)
                .bind(d.address_proof.size)
                .bind(&d.address_proof.mime_type)
                .bind(&d.income_proof.name)
                .bind(d.income_proof.size)
                .bind(&d.income_proof.mime_type),
        };

        let record = query
            .bind(step.number())
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("Upserting {} for {}", step, firebase_uid))?;

        tx.commit()
            .await
            .with_context(|| format!("Committing {} for {}", step, firebase_uid))?;

        tracing::debug!(
            "Upserted {} for {} (step_completed={})",
            step,
            firebase_uid,
            record.step_completed
        );
        Ok(record)
    }

    async fn find(&self, firebase_uid: &str) -> Result<Option<ApplicantRecord>, AppError> {
        let mut tx = self.db.begin().await?;

        let record = sqlx::query_as::<_, ApplicantRecord>(
            "SELECT * FROM onboarding_applications WHERE firebase_uid = $1",
        )
        .bind(firebase_uid)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("Loading application for {}", firebase_uid))?;

        tx.commit().await?;
        Ok(record)
    }
}

/// In-process record store with the same merge rules as [`PgRecordStore`].
///
/// Used by tests and by `STORAGE_BACKEND=memory` for local development.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, ApplicantRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(
        &self,
        firebase_uid: &str,
        data: &StepData,
    ) -> Result<ApplicantRecord, AppError> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let record = records
            .entry(firebase_uid.to_string())
            .or_insert_with(|| ApplicantRecord::new(firebase_uid, now));
        data.apply_to(record, now);
        Ok(record.clone())
    }

    async fn find(&self, firebase_uid: &str) -> Result<Option<ApplicantRecord>, AppError> {
        Ok(self.records.read().await.get(firebase_uid).cloned())
    }
}
