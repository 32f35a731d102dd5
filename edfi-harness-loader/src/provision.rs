use edfi_harness_types::RequestErr;
use serde::Deserialize;
use serde_json::{json, Value as Json};

use crate::{
    loader_err,
    session::{from_response, TokenReply},
    ApiSession, HttpClient, HttpReply, LoaderErr, LoaderResult,
};

/// Scope of a Configuration Service token allowed to register vendors and applications.
pub const CONFIG_SCOPE: &str = "edfi_admin_api/full_access";
/// Claim set of the applications registered by [`ConfigSession::register_client`].
pub const CLAIM_SET: &str = "E2E-NoFurtherAuthRequiredClaimSet";
/// Begin and end of the school year every seeded record belongs to.
pub const SCHOOL_YEAR: (&str, &str) = ("2024-08-01", "2025-05-31");

pub(crate) const GRADE_LEVEL: &str = "uri://ed-fi.org/GradeLevelDescriptor#Ninth grade";
const SCHOOL_CATEGORY: &str = "uri://ed-fi.org/EducationOrganizationCategoryDescriptor#School";

#[derive(Debug, Clone)]
/// An authenticated session with the Configuration Service, which registers API clients.
pub struct ConfigSession {
    base_url: String,
    token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
/// Credentials of an application registered with the Configuration Service.
pub struct ClientCredentials {
    pub key: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
struct VendorReply {
    id: u64,
}

impl ConfigSession {
    pub fn new<S: Into<String>, T: Into<String>>(base_url: S, token: T) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.into(),
        }
    }

    /// Obtain a token at `{base_url}/connect/token` with the client credentials grant, in [`CONFIG_SCOPE`].
    pub async fn connect(
        http: &HttpClient,
        base_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> LoaderResult<Self> {
        let base_url = base_url.trim_end_matches('/');
        log::debug!("Requesting a configuration token at {base_url}");
        let request = http
            .client()
            .post(format!("{base_url}/connect/token"))
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
                ("scope", CONFIG_SCOPE),
            ]);
        let reply = http.invoke(request).await?;
        let token: TokenReply = from_response(reply.response)
            .map_err(|e| loader_err(LoaderErr::Token(e)))?;
        Ok(Self::new(base_url, token.access_token))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the id of the new vendor.
    pub async fn create_vendor(&self, http: &HttpClient, company: &str) -> LoaderResult<u64> {
        let reply = self.post(http, "v2/vendors", &vendor_body(company)).await?;
        let vendor: VendorReply = from_response(reply.response)
            .map_err(|e| loader_err(LoaderErr::Provision(format!("vendor: {e}"))))?;
        Ok(vendor.id)
    }

    pub async fn create_application(
        &self,
        http: &HttpClient,
        vendor_id: u64,
    ) -> LoaderResult<ClientCredentials> {
        let reply = self
            .post(http, "v2/applications", &application_body(vendor_id))
            .await?;
        from_response(reply.response)
            .map_err(|e| loader_err(LoaderErr::Provision(format!("application: {e}"))))
    }

    /// Register a vendor under a random name, then an application of that vendor in [`CLAIM_SET`].
    pub async fn register_client(&self, http: &HttpClient) -> LoaderResult<ClientCredentials> {
        let company = format!("Demo Vendor {}", fastrand::u32(..10_000_000));
        let vendor_id = self.create_vendor(http, &company).await?;
        log::info!("Registered vendor `{company}` as {vendor_id}");
        self.create_application(http, vendor_id).await
    }

    async fn post(
        &self,
        http: &HttpClient,
        path: &str,
        body: &Json,
    ) -> Result<HttpReply, RequestErr> {
        let request = http
            .client()
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.token)
            .json(body);
        http.invoke(request).await
    }
}

impl ApiSession {
    /// Create the school year, the descriptors and the school that students are enrolled in.
    ///
    /// Records that already exist are left as they are, so provisioning the same API twice is fine.
    pub async fn provision(&self, http: &HttpClient, school_id: u64) -> LoaderResult<()> {
        for (resource, body) in seed_records(school_id) {
            let request = http
                .client()
                .post(self.resource_url(resource))
                .bearer_auth(self.token())
                .json(&body);
            match http.invoke(request).await {
                Ok(_) => log::debug!("Created {resource}"),
                Err(e) if is_conflict(&e) => log::debug!("{resource} already exists"),
                Err(e) => return Err(e.into()),
            }
        }
        log::info!("Provisioned school {school_id}");
        Ok(())
    }
}

fn is_conflict(e: &RequestErr) -> bool {
    matches!(e, RequestErr::Status { status: 409, .. })
}

fn vendor_body(company: &str) -> Json {
    json!({
        "company": company,
        "contactName": "George Washington",
        "contactEmailAddress": "george@example.com",
        "namespacePrefixes": "uri://ed-fi.org",
    })
}

fn application_body(vendor_id: u64) -> Json {
    json!({
        "vendorId": vendor_id,
        "applicationName": "Demo application",
        "claimSetName": CLAIM_SET,
    })
}

/// In dependency order.
fn seed_records(school_id: u64) -> Vec<(&'static str, Json)> {
    vec![
        (
            "ed-fi/schoolYearTypes",
            json!({
                "schoolYear": 2024,
                "beginDate": SCHOOL_YEAR.0,
                "endDate": SCHOOL_YEAR.1,
                "schoolYearDescription": "2024-2025",
                "currentSchoolYear": true,
            }),
        ),
        (
            "ed-fi/gradeLevelDescriptors",
            json!({
                "namespace": "uri://ed-fi.org/GradeLevelDescriptor",
                "codeValue": "Ninth grade",
                "shortDescription": "9th Grade",
            }),
        ),
        (
            "ed-fi/educationOrganizationCategoryDescriptors",
            json!({
                "namespace": "uri://ed-fi.org/EducationOrganizationCategoryDescriptor",
                "codeValue": "School",
                "shortDescription": "School",
            }),
        ),
        (
            "ed-fi/schools",
            json!({
                "schoolId": school_id,
                "nameOfInstitution": "Grand Bend High School",
                "shortNameOfInstitution": "GBMS",
                "webSite": "http://www.GBISD.edu/GBMS/",
                "educationOrganizationCategories": [
                    { "educationOrganizationCategoryDescriptor": SCHOOL_CATEGORY }
                ],
                "gradeLevels": [{ "gradeLevelDescriptor": GRADE_LEVEL }],
            }),
        ),
    ]
}
