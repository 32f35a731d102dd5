use edfi_harness_types::{DescriptorErr, RequestErr, Response};
use serde::{Serialize, Serializer};
use serde_json::{json, Value as Json};
use std::time::{Duration, Instant};

use crate::{
    provision::GRADE_LEVEL, ApiSession, HttpClient, HttpReply, LoaderResult, DEFAULT_PAGE_SIZE,
    SCHOOL_YEAR,
};

const STUDENTS: &str = "ed-fi/students";

#[derive(Debug, Clone)]
/// Times the basic read and write paths of the API: create students, read them back one by one,
/// then read them all.
pub struct TimingScenario {
    http: HttpClient,
    session: ApiSession,
    options: ScenarioOptions,
}

#[derive(Debug, Clone)]
pub struct ScenarioOptions {
    student_count: u32,
    school_id: u64,
    id_prefix: String,
    page_size: u64,
    enrollment: Enrollment,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// How every new student is tied to the school.
pub enum Enrollment {
    /// A `studentSchoolAssociation`, entering ninth grade
    #[default]
    School,
    /// A `studentEducationOrganizationAssociation` spanning the school year
    EducationOrganization,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
/// Wall time of each phase of a [`TimingScenario`]. Serialized in seconds.
pub struct ScenarioTimings {
    #[serde(serialize_with = "as_secs")]
    pub create: Duration,
    #[serde(serialize_with = "as_secs")]
    pub by_id: Duration,
    #[serde(serialize_with = "as_secs")]
    pub by_query: Duration,
    #[serde(serialize_with = "as_secs")]
    pub all: Duration,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            student_count: 10,
            school_id: 1,
            id_prefix: "473".to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            enrollment: Enrollment::default(),
        }
    }
}

impl ScenarioOptions {
    /// If unset, defaults to 10.
    pub fn set_student_count(&mut self, v: u32) -> &mut Self {
        self.student_count = v;
        self
    }
    pub fn student_count(&self) -> u32 {
        self.student_count
    }

    /// The school every student is enrolled in. It must exist beforehand; see
    /// [`ApiSession::provision`].
    ///
    /// If unset, defaults to 1.
    pub fn set_school_id(&mut self, v: u64) -> &mut Self {
        self.school_id = v;
        self
    }
    pub fn school_id(&self) -> u64 {
        self.school_id
    }

    /// Student unique ids are this prefix followed by the student's index.
    pub fn set_id_prefix<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.id_prefix = v.into();
        self
    }
    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    /// Must be positive. If unset, defaults to [`DEFAULT_PAGE_SIZE`].
    pub fn set_page_size(&mut self, v: u64) -> Result<&mut Self, DescriptorErr> {
        if v == 0 {
            return Err(DescriptorErr::ZeroSize);
        }
        self.page_size = v;
        Ok(self)
    }
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// If unset, defaults to [`Enrollment::School`].
    pub fn set_enrollment(&mut self, v: Enrollment) -> &mut Self {
        self.enrollment = v;
        self
    }
    pub fn enrollment(&self) -> Enrollment {
        self.enrollment
    }

    fn student_id(&self, i: u32) -> String {
        format!("{}{i}", self.id_prefix)
    }
}

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl Enrollment {
    pub fn resource(&self) -> &'static str {
        match self {
            Self::School => "ed-fi/studentSchoolAssociations",
            Self::EducationOrganization => "ed-fi/studentEducationOrganizationAssociations",
        }
    }

    fn body(&self, student_id: &str, school_id: u64) -> Json {
        match self {
            Self::School => json!({
                "studentReference": { "studentUniqueId": student_id },
                "schoolReference": { "schoolId": school_id },
                "entryDate": SCHOOL_YEAR.0,
                "entryGradeLevelDescriptor": GRADE_LEVEL,
            }),
            Self::EducationOrganization => json!({
                "studentReference": { "studentUniqueId": student_id },
                "educationOrganizationReference": { "educationOrganizationId": school_id },
                "beginDate": SCHOOL_YEAR.0,
                "endDate": SCHOOL_YEAR.1,
            }),
        }
    }
}

impl ScenarioTimings {
    /// `system,count,create,by_id,by_query,all`, in seconds.
    pub fn to_csv_row(&self, system: &str, count: u32) -> String {
        format!(
            "{system},{count},{},{},{},{}",
            self.create.as_secs_f64(),
            self.by_id.as_secs_f64(),
            self.by_query.as_secs_f64(),
            self.all.as_secs_f64()
        )
    }
}

impl TimingScenario {
    pub fn new(http: HttpClient, session: ApiSession, options: ScenarioOptions) -> Self {
        Self {
            http,
            session,
            options,
        }
    }

    /// Run every phase in order. Requests are issued one at a time, and any failed request ends the scenario.
    pub async fn run(&self) -> LoaderResult<ScenarioTimings> {
        let mut timings = ScenarioTimings::default();
        let count = self.options.student_count;

        let start = Instant::now();
        let mut locations = Vec::with_capacity(count as usize);
        for i in 0..count {
            locations.push(self.create_student(i).await?);
        }
        timings.create = start.elapsed();
        log::info!(
            "Created {count} students and their enrollments in {:.2} seconds",
            timings.create.as_secs_f64()
        );

        let start = Instant::now();
        for location in locations.iter() {
            self.get(&self.location_url(location)).await?;
        }
        timings.by_id = start.elapsed();
        log::info!(
            "Retrieved individual student records by id in {:.2} seconds",
            timings.by_id.as_secs_f64()
        );

        let start = Instant::now();
        let students = self.session.resource_url(STUDENTS);
        for i in 0..count {
            let request = self
                .authorized(self.http.client().get(&students))
                .query(&[("studentUniqueId", self.options.student_id(i))]);
            self.http.invoke(request).await?;
        }
        timings.by_query = start.elapsed();
        log::info!(
            "Retrieved individual student records by query in {:.2} seconds",
            timings.by_query.as_secs_f64()
        );

        let start = Instant::now();
        let mut offset = 0;
        loop {
            let request = self
                .authorized(self.http.client().get(&students))
                .query(&[("limit", self.options.page_size), ("offset", offset)]);
            if is_last_page(&self.http.invoke(request).await?.response) {
                break;
            }
            offset += self.options.page_size;
        }
        timings.all = start.elapsed();
        log::info!(
            "Retrieved all students in {:.2} seconds",
            timings.all.as_secs_f64()
        );

        Ok(timings)
    }

    /// Returns the location of the new student.
    async fn create_student(&self, i: u32) -> Result<String, RequestErr> {
        let id = self.options.student_id(i);
        let reply = self.post(STUDENTS, &student_body(&id, i)).await?;
        let location = reply
            .location
            .ok_or_else(|| RequestErr::InvalidResponse(format!("No location for student {id}")))?;
        let enrollment = self.options.enrollment;
        self.post(
            enrollment.resource(),
            &enrollment.body(&id, self.options.school_id),
        )
        .await?;
        Ok(location)
    }

    async fn post(&self, resource: &str, body: &Json) -> Result<HttpReply, RequestErr> {
        let request = self
            .authorized(self.http.client().post(self.session.resource_url(resource)))
            .json(body);
        self.http.invoke(request).await
    }

    async fn get(&self, url: &str) -> Result<HttpReply, RequestErr> {
        self.http
            .invoke(self.authorized(self.http.client().get(url)))
            .await
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.session.token())
    }

    /// The API may answer with an absolute URL or with the bare id.
    fn location_url(&self, location: &str) -> String {
        if location.starts_with("http") {
            location.to_owned()
        } else {
            format!("{}/{location}", self.session.resource_url(STUDENTS))
        }
    }
}

fn is_last_page(response: &Response) -> bool {
    match response {
        Response::Json(Json::Array(items)) => items.is_empty(),
        _ => true,
    }
}

fn student_body(id: &str, i: u32) -> Json {
    json!({
        "studentUniqueId": id,
        "firstName": format!("Student{i}"),
        "lastSurname": format!("LastName{i}"),
        "birthDate": "2012-01-01",
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_csv_row() {
        let timings = ScenarioTimings {
            create: Duration::from_millis(1500),
            by_id: Duration::from_millis(250),
            by_query: Duration::from_millis(500),
            all: Duration::from_secs(2),
        };
        assert_eq!(timings.to_csv_row("dms", 10), "dms,10,1.5,0.25,0.5,2");
    }

    #[test]
    fn test_ids_and_bodies() {
        let mut options = ScenarioOptions::default();
        options.set_id_prefix("99");
        assert_eq!(options.student_id(0), "990");
        assert_eq!(options.student_id(12), "9912");

        let body = Enrollment::School.body("990", 255901);
        assert_eq!(body["studentReference"]["studentUniqueId"], "990");
        assert_eq!(body["schoolReference"]["schoolId"], 255901);
        assert_eq!(student_body("990", 0)["firstName"], "Student0");
    }

    #[test]
    fn test_enrollment() {
        let mut options = ScenarioOptions::default();
        assert_eq!(options.enrollment(), Enrollment::School);
        assert_eq!(
            options.enrollment().resource(),
            "ed-fi/studentSchoolAssociations"
        );

        options
            .set_id_prefix("12345678")
            .set_enrollment(Enrollment::EducationOrganization);
        let enrollment = options.enrollment();
        assert_eq!(
            enrollment.resource(),
            "ed-fi/studentEducationOrganizationAssociations"
        );
        let body = enrollment.body(&options.student_id(1), 1);
        assert_eq!(body["studentReference"]["studentUniqueId"], "123456781");
        assert_eq!(body["educationOrganizationReference"]["educationOrganizationId"], 1);
        assert_eq!(body["beginDate"], "2024-08-01");
        assert_eq!(body["endDate"], "2025-05-31");
    }

    #[test]
    fn test_timings_json() {
        let timings = ScenarioTimings {
            create: Duration::from_millis(1500),
            by_id: Duration::from_millis(250),
            by_query: Duration::ZERO,
            all: Duration::from_secs(2),
        };
        assert_eq!(
            serde_json::to_value(timings).unwrap(),
            json!({ "create": 1.5, "by_id": 0.25, "by_query": 0.0, "all": 2.0 })
        );
    }

    #[test]
    fn test_location_url() {
        let http = HttpClient::from_client(reqwest::Client::new());
        let session = ApiSession::new("http://localhost:8001/data/v3", "t0k3n");
        let scenario = TimingScenario::new(http, session, ScenarioOptions::default());
        assert_eq!(
            scenario.location_url("http://localhost:8001/data/v3/ed-fi/students/abc"),
            "http://localhost:8001/data/v3/ed-fi/students/abc"
        );
        assert_eq!(
            scenario.location_url("abc"),
            "http://localhost:8001/data/v3/ed-fi/students/abc"
        );
    }

    #[test]
    fn test_page_size() {
        let mut options = ScenarioOptions::default();
        assert_eq!(options.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(options.set_page_size(0).unwrap_err(), DescriptorErr::ZeroSize);
        assert_eq!(options.page_size(), DEFAULT_PAGE_SIZE);
        options.set_page_size(25).unwrap();
        assert_eq!(options.page_size(), 25);
    }

    #[test]
    fn test_last_page() {
        assert!(is_last_page(&Response::Json(json!([]))));
        assert!(!is_last_page(&Response::Json(json!([{ "id": "abc" }]))));
        assert!(is_last_page(&Response::Empty));
    }
}
