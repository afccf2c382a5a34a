//! Tests de la aprobación del gerente: aprobar, rechazar y listar.

mod common;

use chrono::Duration;
use tokio_test::assert_ok;

use common::{franja_futura, MemRepo};
use motor_reservas::api::AppError;
use motor_reservas::config::Config;
use motor_reservas::db::{EstadoReserva, FiltroReservas};
use motor_reservas::services::booking::{self, NuevaReserva};
use motor_reservas::services::partner;

const GERENTE: &str = "gerente-1";
const CLIENTE: &str = "cliente-1";

async fn crear_pendiente(
    repo: &MemRepo,
    id_restaurante: mongodb::bson::oid::ObjectId,
    id_mesa: mongodb::bson::oid::ObjectId,
    inicio: chrono::DateTime<chrono::Utc>,
) -> i64 {
    let reserva = booking::create_reservation(
        repo,
        repo,
        &Config::default(),
        NuevaReserva {
            id_restaurante,
            id_mesa,
            id_cliente: CLIENTE.to_string(),
            nombre_cliente: "Juan Pérez".to_string(),
            email_cliente: "juan@email.com".to_string(),
            telefono_cliente: "+34 123 456 789".to_string(),
            numero_personas: 2,
            inicio,
        },
    )
    .await
    .unwrap();
    reserva.numero
}

#[tokio::test]
async fn aprobar_confirma_la_pendiente() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let numero = crear_pendiente(&repo, id_restaurante, id_mesa, franja_futura()).await;

    let reserva =
        assert_ok!(partner::approve_reservation(&repo, &repo, id_restaurante, numero, GERENTE).await);

    assert_eq!(reserva.estado, EstadoReserva::Confirmada);
}

#[tokio::test]
async fn aprobar_dos_veces_falla() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let numero = crear_pendiente(&repo, id_restaurante, id_mesa, franja_futura()).await;

    assert_ok!(partner::approve_reservation(&repo, &repo, id_restaurante, numero, GERENTE).await);

    let repetida = partner::approve_reservation(&repo, &repo, id_restaurante, numero, GERENTE).await;
    assert!(matches!(repetida, Err(AppError::AlreadyProcessed)));
}

#[tokio::test]
async fn rechazar_cancela_la_pendiente() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let numero = crear_pendiente(&repo, id_restaurante, id_mesa, franja_futura()).await;

    let reserva =
        assert_ok!(partner::reject_reservation(&repo, &repo, id_restaurante, numero, GERENTE).await);

    assert_eq!(reserva.estado, EstadoReserva::Cancelada);
}

#[tokio::test]
async fn aprobar_una_cancelada_es_estado_final() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let numero = crear_pendiente(&repo, id_restaurante, id_mesa, franja_futura()).await;

    assert_ok!(partner::reject_reservation(&repo, &repo, id_restaurante, numero, GERENTE).await);

    let resultado = partner::approve_reservation(&repo, &repo, id_restaurante, numero, GERENTE).await;
    assert!(matches!(resultado, Err(AppError::TerminalState)));
}

#[tokio::test]
async fn solo_el_gerente_del_restaurante_puede_aprobar() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let numero = crear_pendiente(&repo, id_restaurante, id_mesa, franja_futura()).await;

    let resultado =
        partner::approve_reservation(&repo, &repo, id_restaurante, numero, "impostor").await;
    assert!(matches!(resultado, Err(AppError::Forbidden(_))));

    // La reserva sigue pendiente
    assert_eq!(repo.estado_de(numero), Some(EstadoReserva::Pendiente));
}

#[tokio::test]
async fn la_reserva_de_otro_restaurante_no_aparece() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let otro_restaurante = repo.alta_restaurante("El Rincón", "gerente-2");
    let numero = crear_pendiente(&repo, id_restaurante, id_mesa, franja_futura()).await;

    let resultado =
        partner::approve_reservation(&repo, &repo, otro_restaurante, numero, "gerente-2").await;
    assert!(matches!(resultado, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn dos_pendientes_solapadas_no_pueden_confirmarse_ambas() {
    // Las dos solicitudes conviven pendientes, pero el almacén veta la
    // segunda confirmada sobre la misma mesa y franja.
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let inicio = franja_futura();

    let primera = crear_pendiente(&repo, id_restaurante, id_mesa, inicio).await;
    let segunda = crear_pendiente(&repo, id_restaurante, id_mesa, inicio).await;

    assert_ok!(partner::approve_reservation(&repo, &repo, id_restaurante, primera, GERENTE).await);

    let resultado =
        partner::approve_reservation(&repo, &repo, id_restaurante, segunda, GERENTE).await;
    assert!(matches!(resultado, Err(AppError::SlotConflict)));

    // Para cada mesa, las confirmadas nunca solapan
    assert_eq!(repo.estado_de(primera), Some(EstadoReserva::Confirmada));
    assert_eq!(repo.estado_de(segunda), Some(EstadoReserva::Pendiente));
}

#[tokio::test]
async fn listar_filtra_por_estado() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);
    let id_mesa = repo.alta_mesa(id_restaurante, 4);
    let inicio = franja_futura();

    let primera = crear_pendiente(&repo, id_restaurante, id_mesa, inicio).await;
    let segunda =
        crear_pendiente(&repo, id_restaurante, id_mesa, inicio + Duration::minutes(60)).await;

    assert_ok!(partner::approve_reservation(&repo, &repo, id_restaurante, primera, GERENTE).await);

    let todas = assert_ok!(
        partner::list_reservations(
            &repo,
            &repo,
            id_restaurante,
            GERENTE,
            &FiltroReservas::default()
        )
        .await
    );
    assert_eq!(todas.len(), 2);

    let pendientes = assert_ok!(
        partner::list_reservations(
            &repo,
            &repo,
            id_restaurante,
            GERENTE,
            &FiltroReservas {
                estado: Some(EstadoReserva::Pendiente),
                fecha: None,
            }
        )
        .await
    );
    assert_eq!(pendientes.len(), 1);
    assert_eq!(pendientes[0].numero, segunda);
}

#[tokio::test]
async fn listar_requiere_ser_el_gerente() {
    let repo = MemRepo::new();
    let id_restaurante = repo.alta_restaurante("La Tasca", GERENTE);

    let resultado = partner::list_reservations(
        &repo,
        &repo,
        id_restaurante,
        "impostor",
        &FiltroReservas::default(),
    )
    .await;

    assert!(matches!(resultado, Err(AppError::Forbidden(_))));
}
