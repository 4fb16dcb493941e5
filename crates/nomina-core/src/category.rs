//! Job title → job category mapping.

use std::collections::BTreeMap;

pub const UNCATEGORIZED: &str = "Sin Categorizar";

/// Known job titles, sorted for binary search.
const TITLE_CATEGORIES: &[(&str, &str)] = &[
    ("ACCESORIOS", "Apoyo Operativo"),
    ("ADMINISTRACION", "Administrativo"),
    ("ADMINISTRACION DE GARANTIAS", "Garantias y Seguros"),
    ("ADMINISTRADOR DE GARANTIAS", "Garantias y Seguros"),
    ("ADMINISTRADOR DE SEMINUEVOS", "Administrativo"),
    ("ADMINISTRADOR DE VENTAS DE FLOTILLAS", "Ventas"),
    ("ADMINISTRATIVO DE POSTVENTA", "Ventas"),
    ("ADMINISTRATIVO DE SERVICIO", "Administrativo"),
    ("ADMINISTRATIVO DE VENTAS", "Ventas"),
    ("ASESOR COMERCIAL", "Ventas"),
    ("ASESOR DE SEGUROS", "Garantias y Seguros"),
    ("ASESOR DE SERVICIO", "Servicio"),
    ("ASESOR DE VENTAS", "Ventas"),
    ("AUXILIAR ADMINISTRATIVO", "Administrativo"),
    ("AUXILIAR CONTABLE", "Administrativo"),
    ("AUXILIAR DE ALMACEN", "Apoyo Operativo"),
    ("AUXILIAR DE SERVICIO", "Servicio"),
    ("CAJERO", "Administrativo"),
    ("COORDINADOR", "Administrativo"),
    ("COORDINADOR DE SEMINUEVOS", "Ventas"),
    ("COORDINADOR DE SERVICIO", "Servicio"),
    ("COORDINADOR DE VENTAS", "Ventas"),
    ("DIRECTOR", "Directivo"),
    ("DIRECTOR DE SUCURSAL", "Directivo"),
    ("EJECUTIVO", "Administrativo"),
    ("EJECUTIVO DE VENTAS", "Ventas"),
    ("ESPECIALISTA", "Técnico"),
    ("GERENTE", "Gerencial"),
    ("GERENTE DE POSTVENTA", "Gerencial"),
    ("GERENTE DE SERVICIO", "Gerencial"),
    ("GERENTE DE VENTAS", "Gerencial"),
    ("GERENTE GENERAL", "Gerencial"),
    ("INTENDENCIA", "Apoyo Operativo"),
    ("JEFE", "Jefatura"),
    ("JEFE DE ALMACEN", "Jefatura"),
    ("JEFE DE SEMINUEVOS", "Jefatura"),
    ("JEFE DE SERVICIO", "Jefatura"),
    ("JEFE DE TALLER", "Jefatura"),
    ("JEFE DE VENTAS", "Jefatura"),
    ("LAVADOR", "Apoyo Operativo"),
    ("MECANICO", "Técnico"),
    ("RECEPCIONISTA", "Administrativo"),
    ("SECRETARIA", "Administrativo"),
    ("SUPERVISOR", "Supervisión"),
    ("SUPERVISOR DE SERVICIO", "Supervisión"),
    ("SUPERVISOR DE VENTAS", "Supervisión"),
    ("TECNICO", "Técnico"),
    ("TECNICO EN SERVICIO", "Técnico"),
    ("VENDEDOR", "Ventas"),
    ("VIGILANTE", "Seguridad"),
];

/// Substring fallbacks, first match wins.
const KEYWORD_CATEGORIES: &[(&str, &str)] = &[
    ("VENDEDOR", "Ventas"),
    ("VENTAS", "Ventas"),
    ("ASESOR", "Ventas"),
    ("GERENTE", "Gerencial"),
    ("DIRECTOR", "Directivo"),
    ("JEFE", "Jefatura"),
    ("SUPERVISOR", "Supervisión"),
    ("COORDINADOR", "Administrativo"),
    ("ADMINISTRATIVO", "Administrativo"),
    ("AUXILIAR", "Apoyo Operativo"),
    ("TECNICO", "Técnico"),
    ("MECANICO", "Técnico"),
    ("SERVICIO", "Servicio"),
    ("SEMINUEVOS", "Ventas"),
    ("GARANTIAS", "Garantias y Seguros"),
    ("SEGUROS", "Garantias y Seguros"),
    ("ALMACEN", "Apoyo Operativo"),
    ("RECEPCION", "Administrativo"),
    ("SECRETARIA", "Administrativo"),
    ("CAJERO", "Administrativo"),
    ("CONTABLE", "Administrativo"),
    ("INTENDENCIA", "Apoyo Operativo"),
    ("LAVADOR", "Apoyo Operativo"),
    ("VIGILANTE", "Seguridad"),
];

/// Category for a job title: exact match, then keyword, else [`UNCATEGORIZED`].
pub fn job_category(title: &str) -> &'static str {
    let upper = title.trim().to_uppercase();
    if upper.is_empty() {
        return UNCATEGORIZED;
    }
    if let Ok(i) = TITLE_CATEGORIES.binary_search_by(|(t, _)| (*t).cmp(upper.as_str())) {
        return TITLE_CATEGORIES[i].1;
    }
    KEYWORD_CATEGORIES
        .iter()
        .find(|(kw, _)| upper.contains(kw))
        .map(|(_, cat)| *cat)
        .unwrap_or(UNCATEGORIZED)
}

/// Roll per-title counts up into per-category counts, sorted by category.
///
/// Uncategorised titles are left out.
pub fn category_counts<'a, I>(titles: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    for (title, count) in titles {
        let category = job_category(title);
        if category != UNCATEGORIZED {
            *counts.entry(category).or_default() += count;
        }
    }
    counts
        .into_iter()
        .map(|(c, n)| (c.to_string(), n))
        .collect()
}

/// All distinct categories, sorted.
pub fn all_categories() -> Vec<&'static str> {
    let mut cats: Vec<&'static str> = TITLE_CATEGORIES.iter().map(|(_, c)| *c).collect();
    cats.sort_unstable();
    cats.dedup();
    cats
}
