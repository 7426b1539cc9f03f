//! Order validation failures.
//!
//! Display strings are shown to the customer verbatim, so they are written in
//! the shop's language.

use thiserror::Error;

use crate::types::{ProductId, ProductType, ToppingId};

/// A selection that cannot be committed, or an order that cannot be sent.
///
/// Returning one of these never changes session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Selecione um tamanho.")]
    NoSizeSelected,

    #[error("Selecione pelo menos um sabor.")]
    NoFlavorsSelected,

    #[error(
        "Selecione exatamente {expected} sabor(es) para o tamanho {size}. Voce selecionou {selected}."
    )]
    FlavorCountMismatch {
        size: String,
        expected: u32,
        selected: u32,
    },

    #[error("O tamanho {size} aceita no maximo {max} sabor(es). Voce selecionou {selected}.")]
    TooManyFlavors { size: String, max: u32, selected: u32 },

    #[error("Selecione uma caixa.")]
    NoBoxSelected,

    #[error("Selecione exatamente {expected} unidades para esta caixa. Voce selecionou {selected}.")]
    BoxCountMismatch { expected: u32, selected: u32 },

    #[error("Selecione pelo menos um item.")]
    NothingSelected(ProductType),

    #[error("A quantidade deve ser pelo menos 1.")]
    InvalidQuantity,

    #[error("Produto indisponivel: {0}")]
    UnknownProduct(ProductId),

    #[error("Cobertura indisponivel: {0}")]
    UnknownTopping(ToppingId),
}
