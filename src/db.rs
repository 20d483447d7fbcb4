use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::grading::parse_text_or_zero;
use crate::models::{ResultsBySessionAndTerm, ScoreRecord, StudentProfile, UNKNOWN_SUBJECT};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_student(pool: &PgPool, profile: &StudentProfile) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO result_portal.students (id, admission_number, full_name, class_name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (admission_number) DO UPDATE
        SET full_name = EXCLUDED.full_name, class_name = EXCLUDED.class_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&profile.admission_number)
    .bind(&profile.full_name)
    .bind(&profile.class_name)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

async fn upsert_subject(pool: &PgPool, name: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO result_portal.subjects (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

/// Nullable score columns of one results row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoreColumns {
    first_ca: Option<f64>,
    second_ca: Option<f64>,
    exam_score: Option<f64>,
}

/// NULL columns read back as 0.
fn record_from_columns(subject_name: Option<String>, scores: ScoreColumns) -> ScoreRecord {
    ScoreRecord::new(
        subject_name.unwrap_or_else(|| UNKNOWN_SUBJECT.to_string()),
        scores.first_ca.unwrap_or(0.0),
        scores.second_ca.unwrap_or(0.0),
        scores.exam_score.unwrap_or(0.0),
    )
}

struct NewResult<'a> {
    student_id: Uuid,
    subject_id: Uuid,
    session: &'a str,
    term: &'a str,
    scores: ScoreColumns,
    source_key: String,
}

async fn insert_result(pool: &PgPool, row: NewResult<'_>) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO result_portal.results
        (id, student_id, subject_id, session, term, first_ca, second_ca, exam_score, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(row.student_id)
    .bind(row.subject_id)
    .bind(row.session)
    .bind(row.term)
    .bind(row.scores.first_ca)
    .bind(row.scores.second_ca)
    .bind(row.scores.exam_score)
    .bind(row.source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let student = StudentProfile {
        admission_number: "GSS/2021/014".to_string(),
        full_name: "Amara Okafor".to_string(),
        class_name: "JSS 3A".to_string(),
    };
    let student_id = upsert_student(pool, &student).await?;

    let results = vec![
        ("2023/2024", "Third Term", "Mathematics", 12.0, 14.0, 38.0),
        ("2023/2024", "Third Term", "English Language", 15.0, 16.0, 41.0),
        ("2023/2024", "Third Term", "Basic Science", 11.0, 10.0, 30.0),
        ("2024/2025", "First Term", "Mathematics", 14.0, 13.0, 40.0),
        ("2024/2025", "First Term", "English Language", 16.0, 15.0, 44.0),
        ("2024/2025", "First Term", "Basic Science", 13.0, 12.0, 33.0),
        ("2024/2025", "Second Term", "Mathematics", 17.0, 18.0, 52.0),
        ("2024/2025", "Second Term", "English Language", 15.0, 16.0, 42.0),
        ("2024/2025", "Second Term", "Basic Science", 12.0, 14.0, 28.0),
        ("2024/2025", "Second Term", "Basic Technology", 16.0, 15.0, 40.0),
    ];

    for (session, term, subject, first_ca, second_ca, exam_score) in results {
        let subject_id = upsert_subject(pool, subject).await?;
        insert_result(
            pool,
            NewResult {
                student_id,
                subject_id,
                session,
                term,
                scores: ScoreColumns {
                    first_ca: Some(first_ca),
                    second_ca: Some(second_ca),
                    exam_score: Some(exam_score),
                },
                source_key: format!("seed-{}-{session}-{term}-{subject}", student.admission_number),
            },
        )
        .await?;
    }

    Ok(())
}

pub async fn fetch_student(pool: &PgPool, admission_number: &str) -> anyhow::Result<StudentProfile> {
    let row = sqlx::query(
        "SELECT admission_number, full_name, class_name \
         FROM result_portal.students WHERE admission_number = $1",
    )
    .bind(admission_number)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no student with admission number {admission_number}"))?;

    Ok(StudentProfile {
        admission_number: row.get("admission_number"),
        full_name: row.get("full_name"),
        class_name: row.get("class_name"),
    })
}

pub async fn fetch_results(
    pool: &PgPool,
    admission_number: &str,
) -> anyhow::Result<ResultsBySessionAndTerm> {
    let rows = sqlx::query(
        "SELECT r.session, r.term, sub.name AS subject_name, \
         r.first_ca, r.second_ca, r.exam_score \
         FROM result_portal.results r \
         JOIN result_portal.students st ON st.id = r.student_id \
         LEFT JOIN result_portal.subjects sub ON sub.id = r.subject_id \
         WHERE st.admission_number = $1 \
         ORDER BY r.session, r.term, sub.name",
    )
    .bind(admission_number)
    .fetch_all(pool)
    .await?;

    let mut results = ResultsBySessionAndTerm::new();

    for row in rows {
        let session: String = row.get("session");
        let term: String = row.get("term");
        let subject_name: Option<String> = row.get("subject_name");
        let first_ca: Option<f64> = row.get("first_ca");
        let second_ca: Option<f64> = row.get("second_ca");
        let exam_score: Option<f64> = row.get("exam_score");

        results
            .entry(session)
            .or_default()
            .entry(term)
            .or_default()
            .push(record_from_columns(
                subject_name,
                ScoreColumns {
                    first_ca,
                    second_ca,
                    exam_score,
                },
            ));
    }

    Ok(results)
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    admission_number: String,
    full_name: String,
    class_name: String,
    session: String,
    term: String,
    subject: String,
    first_ca: Option<String>,
    second_ca: Option<String>,
    exam_score: Option<String>,
    source_key: Option<String>,
}

/// Blank cells stay NULL; anything else is tolerant-parsed.
fn csv_score(value: Option<&str>) -> Option<f64> {
    match value {
        Some(text) if !text.trim().is_empty() => Some(parse_text_or_zero(Some(text))),
        _ => None,
    }
}

impl CsvRow {
    fn scores(&self) -> ScoreColumns {
        ScoreColumns {
            first_ca: csv_score(self.first_ca.as_deref()),
            second_ca: csv_score(self.second_ca.as_deref()),
            exam_score: csv_score(self.exam_score.as_deref()),
        }
    }
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let scores = row.scores();
        let student_id = upsert_student(
            pool,
            &StudentProfile {
                admission_number: row.admission_number.clone(),
                full_name: row.full_name,
                class_name: row.class_name,
            },
        )
        .await?;
        let subject_id = upsert_subject(pool, &row.subject).await?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let affected = insert_result(
            pool,
            NewResult {
                student_id,
                subject_id,
                session: &row.session,
                term: &row.term,
                scores,
                source_key,
            },
        )
        .await?;

        if affected > 0 {
            inserted += 1;
        }
    }

    log::info!("imported {inserted} result rows from {}", csv_path.display());
    Ok(inserted)
}
