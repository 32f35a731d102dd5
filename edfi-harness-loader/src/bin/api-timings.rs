use anyhow::Result;
use clap::{Parser, ValueEnum};
use edfi_harness_loader::{
    ApiSession, ConfigSession, Enrollment, HttpClient, ScenarioOptions, TimingScenario,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum System {
    Ods,
    Dms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EnrollmentArg {
    School,
    EducationOrganization,
}

#[derive(Debug, Parser)]
struct Args {
    #[clap(long, value_enum, help = "System being tested")]
    system: System,
    #[clap(long, env = "STUDENT_COUNT", default_value_t = 10)]
    student_count: u32,
    #[clap(long, env = "API_PORT", default_value_t = 8001)]
    api_port: u16,
    #[clap(long, env = "CLIENT_ID", default_value = "minimalKey")]
    client_id: String,
    #[clap(long, env = "CLIENT_SECRET", default_value = "minimalSecret")]
    client_secret: String,
    #[clap(long, default_value_t = 1, help = "The school students are enrolled in")]
    school_id: u64,
    #[clap(
        long,
        value_enum,
        default_value = "school",
        help = "How students are tied to the school"
    )]
    enrollment: EnrollmentArg,
    #[clap(
        long,
        help = "Register a client with the Configuration Service and create the school before timing"
    )]
    provision: bool,
    #[clap(long, env = "CONFIG_PORT", default_value_t = 8081)]
    config_port: u16,
    #[clap(long, env = "SYS_ADMIN_ID", default_value = "DmsConfigurationService")]
    sys_admin_id: String,
    #[clap(long, env = "SYS_ADMIN_SECRET", default_value = "s3creT@09")]
    sys_admin_secret: String,
    #[clap(long, help = "Print the timings as JSON instead of CSV")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let http = HttpClient::new()?;
    let base_url = format!("http://localhost:{}", args.api_port);

    let (client_id, client_secret) = if args.provision {
        println!("Create a Configuration Service token, then a vendor and an application");
        let config_url = format!("http://localhost:{}", args.config_port);
        let config =
            ConfigSession::connect(&http, &config_url, &args.sys_admin_id, &args.sys_admin_secret)
                .await?;
        let credentials = config.register_client(&http).await?;
        (credentials.key, credentials.secret)
    } else {
        (args.client_id.clone(), args.client_secret.clone())
    };

    println!("Read the token URL from the discovery API, then create a token");
    let session = ApiSession::connect(&http, &base_url, &client_id, &client_secret).await?;

    if args.provision {
        println!("Create the school year, descriptors and school {}", args.school_id);
        session.provision(&http, args.school_id).await?;
    }

    let mut options = ScenarioOptions::default();
    options
        .set_student_count(args.student_count)
        .set_school_id(args.school_id)
        .set_enrollment(match args.enrollment {
            EnrollmentArg::School => Enrollment::School,
            EnrollmentArg::EducationOrganization => Enrollment::EducationOrganization,
        });
    println!(
        "Creating {} students and their enrollments",
        args.student_count
    );
    let timings = TimingScenario::new(http, session, options).run().await?;

    println!("Created students in {:.2} seconds", timings.create.as_secs_f64());
    println!("Retrieved students by id in {:.2} seconds", timings.by_id.as_secs_f64());
    println!("Retrieved students by query in {:.2} seconds", timings.by_query.as_secs_f64());
    println!("Retrieved all students in {:.2} seconds", timings.all.as_secs_f64());

    let system = match args.system {
        System::Ods => "ods",
        System::Dms => "dms",
    };
    if args.json {
        println!("{}", serde_json::to_string(&timings)?);
    } else {
        println!("{}", timings.to_csv_row(system, args.student_count));
    }

    Ok(())
}
