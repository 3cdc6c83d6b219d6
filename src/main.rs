use flow::{BlobStore, CancellationToken, Transactional};
use insurance_domain::{DomainStubs, IdentificationRecord, IdentificationStatus, Passport, Person, WorkflowScope};
use insurance_persistence::{DieselWorkflowStore, FsBlobStore};
use insurance_workflow::{ApplicationService, IdentificationService, InsuranceService, WorkflowConfig};
use log::info;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

/// Menú interactivo sobre los tres flujos del motor de seguros, usando la
/// base de datos de `WORKFLOW_DB_URL` y los blobs de `WORKFLOW_BLOB_DIR`.
///
/// Opciones soportadas:
/// 1) Sembrar catálogo de demostración (y un cliente ya identificado)
/// 2) Registrar identificación desde un JSON
/// 3) Vincular referencia desde un JSON
/// 4) Crear póliza desde un JSON
/// 5) Crear solicitud desde un JSON
/// 6) Ver póliza
/// 7) Salir
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let store = Arc::new(insurance_persistence::new_from_env()?);
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::from_env()?);
    let config = WorkflowConfig::from_env()?;
    let config_parallel = config.parallel_uploads;
    let insurance = InsuranceService::new(store.clone(), blobs.clone(), config.clone());
    let identification = IdentificationService::new(store.clone(), blobs.clone(), config.clone());
    let application = ApplicationService::new(store.clone(), blobs, config);
    let cancel = CancellationToken::new();
    info!("main-core listo (subidas en paralelo: {})", config_parallel);

    loop {
        println!("\n== Insurance flow menu ==");
        println!("1) Sembrar catálogo de demostración");
        println!("2) Registrar identificación (JSON)");
        println!("3) Vincular referencia a identificación (JSON)");
        println!("4) Crear póliza (JSON)");
        println!("5) Crear solicitud (JSON)");
        println!("6) Ver póliza");
        println!("7) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => match seed_demo(&store) {
                Ok(id) => println!("Catálogo sembrado; cliente 100 identificado en 'acme' ({})", id),
                Err(e) => eprintln!("Error sembrando catálogo: {}", e),
            },
            "2" => {
                let Some(req) = read_request()? else { continue };
                match identification.register_identification(&req, &cancel) {
                    Ok(id) => println!("Identificación registrada: {}", id),
                    Err(e) => eprintln!("Error [{}]: {}", e.kind(), e),
                }
            }
            "3" => {
                let Some(req) = read_request()? else { continue };
                match identification.attach_reference(&req, &cancel) {
                    Ok(outcome) => println!("Referencia vinculada: {:?}", outcome),
                    Err(e) => eprintln!("Error [{}]: {}", e.kind(), e),
                }
            }
            "4" => {
                let Some(req) = read_request()? else { continue };
                match insurance.create_insurance(&req, &cancel) {
                    Ok(id) => println!("Póliza creada: {}", id),
                    Err(e) => eprintln!("Error [{}]: {}", e.kind(), e),
                }
            }
            "5" => {
                let Some(req) = read_request()? else { continue };
                match application.create_application(&req, &cancel) {
                    Ok(id) => println!("Solicitud creada: {}", id),
                    Err(e) => eprintln!("Error [{}]: {}", e.kind(), e),
                }
            }
            "6" => {
                let id_s = prompt("Id de la póliza (UUID): ")?;
                let id = match Uuid::parse_str(id_s.trim()) {
                    Ok(u) => u,
                    Err(_) => {
                        eprintln!("UUID inválido");
                        continue;
                    }
                };
                match insurance.get_insurance(id) {
                    Ok(view) => println!("{}", serde_json::to_string_pretty(&view.insurance)?),
                    Err(e) => eprintln!("Error [{}]: {}", e.kind(), e),
                }
            }
            "7" => break,
            other => println!("Opción no válida: {}", other),
        }
    }
    Ok(())
}

fn seed_demo(store: &DieselWorkflowStore) -> Result<Uuid, Box<dyn Error>> {
    store.seed_catalog(&DomainStubs::sample_store().snapshot()?)?;
    let mut scope = store.begin()?;
    if let Some(existing) = scope.find_identification(100, "acme")? {
        store.rollback(scope)?;
        return Ok(existing.id);
    }
    let person = demo_person();
    let client_id = scope.insert_client(100, &person)?;
    let mut record = IdentificationRecord::new(client_id, 100, DomainStubs::sample_product().provider_id, "acme");
    record.status = IdentificationStatus::Identified;
    scope.insert_identification(&record)?;
    store.commit(scope)?;
    Ok(record.id)
}

fn demo_person() -> Person {
    let birth = chrono::NaiveDate::from_ymd_opt(1985, 4, 12).unwrap_or_default();
    Person { name: "Demo".into(),
             surname: "Cliente".into(),
             patronymic: None,
             person_type: "individual".into(),
             birth_date: birth,
             phone: String::new(),
             email: String::new(),
             registration_address: String::new(),
             actual_address: String::new(),
             postal_address: String::new(),
             passport: Passport { series: "0000".into(),
                                  number: "000000".into(),
                                  issued_by: "demo".into(),
                                  issue_date: birth,
                                  department_code: "000-000".into() },
             citizenship_country_code: None,
             migration_card_number: None,
             residence_permit_number: None,
             documents: Vec::new() }
}

/// Lee y deserializa el JSON de la ruta indicada; `None` si no se pudo.
fn read_request<R: DeserializeOwned>() -> io::Result<Option<R>> {
    let path = prompt("Ruta del fichero JSON: ")?;
    let file = match std::fs::File::open(path.trim()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("No se pudo abrir {}: {}", path.trim(), e);
            return Ok(None);
        }
    };
    match serde_json::from_reader(io::BufReader::new(file)) {
        Ok(req) => Ok(Some(req)),
        Err(e) => {
            eprintln!("JSON inválido: {}", e);
            Ok(None)
        }
    }
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
