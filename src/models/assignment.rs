// src/models/assignment.rs

// Regras comuns a kits e ordens de retirada: ambos entregam unidades a um empleado
// e as recebem de volta uma a uma.

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::product_stock::ensure_distinct;

/// Linha de detalhe que pode ser devolvida.
pub trait ReturnableDetail {
    fn detail_id(&self) -> Uuid;
    fn product_stock_id(&self) -> Uuid;
    fn is_returned(&self) -> bool;
}

/// Resultado do planejamento de uma devolução.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnPlan {
    pub detail_ids: Vec<Uuid>,
    pub product_stock_ids: Vec<Uuid>,
}

/// Avaliado sobre os detalhes relidos depois da devolução, nunca sobre um plano antigo.
pub fn is_complete<D: ReturnableDetail>(details: &[D]) -> bool {
    !details.is_empty() && details.iter().all(|d| d.is_returned())
}

/// Valida os ids pedidos contra os detalhes do kit/ordem.
pub fn plan_return<D: ReturnableDetail>(
    owner_id: Uuid,
    details: &[D],
    requested: &[Uuid],
) -> Result<ReturnPlan, AppError> {
    ensure_distinct(requested)?;

    let mut detail_ids = Vec::with_capacity(requested.len());
    for stock_id in requested {
        let detail = details
            .iter()
            .find(|d| d.product_stock_id() == *stock_id)
            .ok_or(AppError::NotPartOfAssignment { owner_id, stock_id: *stock_id })?;

        if detail.is_returned() {
            return Err(AppError::AlreadyReturned(*stock_id));
        }
        detail_ids.push(detail.detail_id());
    }

    Ok(ReturnPlan { detail_ids, product_stock_ids: requested.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        id: Uuid,
        stock: Uuid,
        returned: bool,
    }

    impl ReturnableDetail for Line {
        fn detail_id(&self) -> Uuid { self.id }
        fn product_stock_id(&self) -> Uuid { self.stock }
        fn is_returned(&self) -> bool { self.returned }
    }

    fn line(returned: bool) -> Line {
        Line { id: Uuid::new_v4(), stock: Uuid::new_v4(), returned }
    }

    // Aplica o plano sobre os detalhes, como o UPDATE de mark_returned
    fn apply(lines: &mut [Line], plan: &ReturnPlan) {
        for l in lines.iter_mut().filter(|l| plan.detail_ids.contains(&l.id)) {
            l.returned = true;
        }
    }

    #[test]
    fn partial_return_does_not_complete() {
        let mut lines = vec![line(false), line(false), line(false)];
        let plan = plan_return(Uuid::new_v4(), &lines, &[lines[0].stock]).unwrap();
        assert_eq!(plan.detail_ids, vec![lines[0].id]);
        apply(&mut lines, &plan);
        assert!(!is_complete(&lines));
    }

    #[test]
    fn returning_the_last_units_completes() {
        let mut lines = vec![line(true), line(false), line(false)];
        let plan = plan_return(Uuid::new_v4(), &lines, &[lines[2].stock, lines[1].stock]).unwrap();
        assert_eq!(plan.detail_ids, vec![lines[2].id, lines[1].id]);
        apply(&mut lines, &plan);
        assert!(is_complete(&lines));
    }

    #[test]
    fn two_returns_planned_from_the_same_read_still_complete() {
        // Últimas duas unidades devolvidas em requisições separadas
        let mut lines = vec![line(true), line(false), line(false)];
        let first = plan_return(Uuid::new_v4(), &lines, &[lines[1].stock]).unwrap();
        let second = plan_return(Uuid::new_v4(), &lines, &[lines[2].stock]).unwrap();

        apply(&mut lines, &first);
        assert!(!is_complete(&lines));
        apply(&mut lines, &second);
        assert!(is_complete(&lines));
    }

    #[test]
    fn unit_outside_the_assignment_is_rejected() {
        let owner = Uuid::new_v4();
        let lines = vec![line(false)];
        let stranger = Uuid::new_v4();
        let err = plan_return(owner, &lines, &[stranger]).unwrap_err();
        assert!(matches!(
            err,
            AppError::NotPartOfAssignment { owner_id, stock_id } if owner_id == owner && stock_id == stranger
        ));
    }

    #[test]
    fn double_return_is_rejected() {
        let lines = vec![line(true), line(false)];
        let err = plan_return(Uuid::new_v4(), &lines, &[lines[0].stock]).unwrap_err();
        assert!(matches!(err, AppError::AlreadyReturned(id) if id == lines[0].stock));
    }

    #[test]
    fn resending_a_returned_unit_to_an_open_kit_is_a_bad_request() {
        let lines = vec![line(true), line(false)];
        let err = plan_return(Uuid::new_v4(), &lines, &[lines[0].stock, lines[1].stock]).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn completion_requires_every_detail() {
        assert!(!is_complete::<Line>(&[]));
        assert!(!is_complete(&[line(true), line(false)]));
        assert!(is_complete(&[line(true), line(true)]));
    }
}
