mod catalog;
mod error;
mod identity;
mod ledger;
mod library;
mod models;
mod robot;
mod seed;
mod storage;

use actix_web::{
    get,
    middleware::Logger,
    post,
    web::{route, Data, Json, Path, Query, ServiceConfig},
    App, HttpResponse, HttpServer,
};
use error::LibraryError;
use identity::NewUser;
use library::{Decision, Library};
use models::{RequestStatus, Role};
use serde::Deserialize;
use std::{
    env::var,
    error::Error,
    net::{Ipv4Addr, SocketAddrV4},
};
use storage::{FileStorage, MemoryStorage, Storage};

type E = Box<dyn Error>;

#[actix_web::main]
async fn main() -> Result<(), E> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let port: u16 = var("PORT")
        .ok()
        .and_then(|text| text.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);

    // Requests survive restarts only when a data directory is configured.
    let store: Box<dyn Storage> = match var("LIBRA_DATA_DIR") {
        Ok(dir) => Box::new(FileStorage::new(dir.into())?),
        Err(_) => Box::new(MemoryStorage::new()),
    };
    let library = Data::new(Library::seeded(store));

    log::info!("listening on {addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(library.clone())
            .configure(routes)
            .default_service(route().to(fallback))
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

fn routes(cfg: &mut ServiceConfig) {
    cfg.service(auth_login)
        .service(auth_register)
        .service(book_top_by_genre)
        .service(book_list)
        .service(book_add)
        .service(book_get)
        .service(request_list)
        .service(request_create)
        .service(request_set_status)
        .service(book_issue)
        .service(book_return)
        .service(recommendation_get)
        .service(robot_get);
}

#[derive(Debug, Deserialize)]
struct LoginData {
    email: String,
    password: String,
}

#[post("/auth/login")]
async fn auth_login(
    data: Json<LoginData>,
    library: Data<Library>,
) -> Result<HttpResponse, LibraryError> {
    let session = library.login(&data.email, &data.password)?;
    Ok(HttpResponse::Ok().json(session))
}

#[derive(Debug, Deserialize)]
struct RegisterData {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    role: Role,
    field_of_study: Option<String>,
}

#[post("/auth/register")]
async fn auth_register(data: Json<RegisterData>, library: Data<Library>) -> HttpResponse {
    let data = data.into_inner();
    let session = library.register(NewUser {
        first_name: data.first_name,
        last_name: data.last_name,
        email: data.email,
        password: data.password,
        role: data.role,
        field_of_study: data.field_of_study,
    });
    HttpResponse::Ok().json(session)
}

#[derive(Debug, Deserialize)]
struct BookListQuery {
    filter: Option<String>,
}

#[get("/books")]
async fn book_list(query: Query<BookListQuery>, library: Data<Library>) -> HttpResponse {
    let books = library.list_books(query.filter.as_deref().unwrap_or(""));
    HttpResponse::Ok().json(books)
}

#[get("/books/top_by_genre")]
async fn book_top_by_genre(library: Data<Library>) -> HttpResponse {
    HttpResponse::Ok().json(library.top_books_by_genre())
}

#[get("/books/{id}")]
async fn book_get(id: Path<u32>, library: Data<Library>) -> Result<HttpResponse, LibraryError> {
    let book = library.get_book(*id)?;
    Ok(HttpResponse::Ok().json(book))
}

#[derive(Debug, Deserialize)]
struct AddBookData {
    title: String,
    author: String,
    tag_id: String,
    bin_id: u32,
}

#[post("/books")]
async fn book_add(data: Json<AddBookData>, library: Data<Library>) -> HttpResponse {
    let book = library.add_book(&data.title, &data.author, &data.tag_id, data.bin_id);
    HttpResponse::Ok().json(book)
}

#[derive(Debug, Deserialize)]
struct RequestListQuery {
    student_id: Option<u32>,
    status: Option<RequestStatus>,
}

#[get("/requests")]
async fn request_list(query: Query<RequestListQuery>, library: Data<Library>) -> HttpResponse {
    let requests = library.list_requests(query.student_id, query.status);
    HttpResponse::Ok().json(requests)
}

#[derive(Debug, Deserialize)]
struct CreateRequestData {
    student_id: u32,
    book_id: u32,
}

#[post("/requests")]
async fn request_create(
    data: Json<CreateRequestData>,
    library: Data<Library>,
) -> Result<HttpResponse, LibraryError> {
    let request = library.create_request(data.student_id, data.book_id)?;
    Ok(HttpResponse::Ok().json(request))
}

#[derive(Debug, Deserialize)]
struct DecisionData {
    status: Decision,
}

#[post("/requests/{id}/status")]
async fn request_set_status(
    id: Path<u32>,
    data: Json<DecisionData>,
    library: Data<Library>,
) -> Result<HttpResponse, LibraryError> {
    let request = library.set_request_status(*id, data.status)?;
    Ok(HttpResponse::Ok().json(request))
}

#[derive(Debug, Deserialize)]
struct IssueData {
    identifier: String,
    student_id: u32,
}

#[post("/issue")]
async fn book_issue(
    data: Json<IssueData>,
    library: Data<Library>,
) -> Result<HttpResponse, LibraryError> {
    let receipt = library.direct_issue(&data.identifier, data.student_id)?;
    Ok(HttpResponse::Ok().json(receipt))
}

#[derive(Debug, Deserialize)]
struct ReturnData {
    identifier: String,
}

#[post("/return")]
async fn book_return(
    data: Json<ReturnData>,
    library: Data<Library>,
) -> Result<HttpResponse, LibraryError> {
    let book = library.direct_return(&data.identifier)?;
    Ok(HttpResponse::Ok().json(book))
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    student_id: u32,
    field_of_study: Option<String>,
}

#[get("/recommendations")]
async fn recommendation_get(
    query: Query<RecommendationQuery>,
    library: Data<Library>,
) -> HttpResponse {
    let recommendation =
        library.recommendations(query.student_id, query.field_of_study.as_deref());
    HttpResponse::Ok().json(recommendation)
}

#[get("/robot")]
async fn robot_get(library: Data<Library>) -> HttpResponse {
    HttpResponse::Ok().json(library.robot_status())
}

async fn fallback() -> HttpResponse {
    HttpResponse::NotFound().body("no endpoint, but connection to api is successful.")
}
