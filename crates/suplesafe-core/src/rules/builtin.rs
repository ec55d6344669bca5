//! Compiled-in rule tables.
//!
//! Built once on first use and shared as `Arc<RuleTables>`. Override tables
//! loaded from disk go through the same validation as this data (see tests).

use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::tables::{
    AliasSet, ContraindicationRule, DepletionRule, NutrientConflictRule, PreferredForm,
    RuleTables, Trigger, UpperLimitRule,
};
use crate::types::{Gender, Severity};
use crate::units::Unit;

/// Version stamp of the compiled-in data.
pub const BUILTIN_TABLES_VERSION: &str = "2026.10";

lazy_static! {
    static ref BUILTIN: Arc<RuleTables> = Arc::new(build());
}

/// Shared handle to the compiled-in tables.
pub fn builtin_tables() -> Arc<RuleTables> {
    Arc::clone(&BUILTIN)
}

fn alias_set(label: &str, aliases: &[&str]) -> AliasSet {
    AliasSet {
        label: label.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn limit(unit: Unit, long_term: f64, short_term: f64, notes: Option<&str>) -> UpperLimitRule {
    UpperLimitRule {
        unit,
        long_term,
        short_term,
        notes: notes.map(str::to_string),
    }
}

fn rule(trigger: Trigger, severity: Severity, message: &str, recommendation: &str) -> ContraindicationRule {
    ContraindicationRule {
        trigger,
        severity,
        message: message.to_string(),
        recommendation: recommendation.to_string(),
    }
}

fn medication(category: &str) -> Trigger {
    Trigger::Medication {
        category: category.to_string(),
    }
}

fn condition(condition: &str) -> Trigger {
    Trigger::Condition {
        condition: condition.to_string(),
    }
}

fn depletion(nutrient: &str, mechanism: &str) -> DepletionRule {
    DepletionRule {
        nutrient: nutrient.to_string(),
        supplement: nutrient.to_string(),
        mechanism: Some(mechanism.to_string()),
    }
}

fn form(form: &str, reason: &str) -> PreferredForm {
    PreferredForm {
        form: form.to_string(),
        reason: reason.to_string(),
    }
}

fn conflict(a: &str, b: &str, message: &str, recommendation: &str) -> NutrientConflictRule {
    NutrientConflictRule {
        supplements: [a.to_string(), b.to_string()],
        severity: Severity::Minor,
        message: message.to_string(),
        recommendation: recommendation.to_string(),
    }
}

fn medication_categories() -> BTreeMap<String, AliasSet> {
    [
        ("anticoagulantes", alias_set("Anticoagulantes", &[
            "anticoagulante", "warfarina", "acenocumarol", "sintrom", "coumadin",
            "apixaban", "eliquis", "rivaroxaban", "xarelto", "dabigatran", "pradaxa",
            "edoxaban", "heparina", "enoxaparina", "clexane",
        ])),
        ("antiagregantes", alias_set("Antiagregantes plaquetarios", &[
            "antiagregante", "aspirina", "acido acetilsalicilico", "adiro",
            "clopidogrel", "plavix", "ticagrelor", "prasugrel",
        ])),
        ("antidepresivos", alias_set("Antidepresivos", &[
            "antidepresivo", "sertralina", "fluoxetina", "paroxetina", "citalopram",
            "escitalopram", "venlafaxina", "duloxetina", "trazodona", "mirtazapina",
            "isrs", "imao",
        ])),
        ("anticonceptivos", alias_set("Anticonceptivos hormonales", &[
            "anticonceptivo", "pildora anticonceptiva", "etinilestradiol",
            "levonorgestrel", "drospirenona", "desogestrel",
        ])),
        ("levotiroxina", alias_set("Hormona tiroidea", &[
            "levotiroxina", "eutirox", "synthroid", "levothroid",
        ])),
        ("metformina", alias_set("Metformina", &["metformina", "dianben", "glucophage"])),
        ("ibp", alias_set("Inhibidores de la bomba de protones", &[
            "omeprazol", "pantoprazol", "esomeprazol", "lansoprazol", "rabeprazol",
            "protector gastrico", "ibp",
        ])),
        ("estatinas", alias_set("Estatinas", &[
            "estatina", "atorvastatina", "simvastatina", "rosuvastatina",
            "pravastatina", "lovastatina", "pitavastatina",
        ])),
        ("diureticos_tiazidicos", alias_set("Diuréticos tiazídicos", &[
            "hidroclorotiazida", "clortalidona", "indapamida", "tiazida",
        ])),
        ("diureticos_asa", alias_set("Diuréticos de asa", &[
            "furosemida", "seguril", "torasemida", "bumetanida",
        ])),
        ("ieca_ara2", alias_set("IECA / ARA-II", &[
            "enalapril", "lisinopril", "ramipril", "captopril", "perindopril",
            "losartan", "valsartan", "candesartan", "irbesartan", "olmesartan",
            "telmisartan", "ieca", "ara ii",
        ])),
        ("ahorradores_potasio", alias_set("Diuréticos ahorradores de potasio", &[
            "espironolactona", "aldactone", "eplerenona", "amilorida", "triamtereno",
        ])),
        ("corticoides", alias_set("Corticoides", &[
            "corticoide", "prednisona", "prednisolona", "dexametasona",
            "metilprednisolona", "hidrocortisona", "deflazacort",
        ])),
        ("antibioticos_quelables", alias_set("Quinolonas y tetraciclinas", &[
            "ciprofloxacino", "levofloxacino", "moxifloxacino", "doxiciclina",
            "tetraciclina", "minociclina",
        ])),
        ("sedantes", alias_set("Sedantes e hipnóticos", &[
            "sedante", "benzodiacepina", "lorazepam", "diazepam", "alprazolam",
            "clonazepam", "zolpidem", "lormetazepam", "orfidal", "valium",
        ])),
        ("inmunosupresores", alias_set("Inmunosupresores", &[
            "inmunosupresor", "ciclosporina", "tacrolimus", "micofenolato",
            "azatioprina", "sirolimus",
        ])),
        ("anticonvulsivos", alias_set("Anticonvulsivos", &[
            "anticonvulsivo", "antiepileptico", "fenitoina", "carbamazepina",
            "acido valproico", "valproato", "fenobarbital", "lamotrigina",
        ])),
        ("metotrexato", alias_set("Metotrexato", &["metotrexato", "methotrexate"])),
        ("bisfosfonatos", alias_set("Bisfosfonatos", &[
            "bisfosfonato", "alendronato", "risedronato", "ibandronato", "fosamax",
        ])),
    ]
    .into_iter()
    .map(|(id, set)| (id.to_string(), set))
    .collect()
}

fn conditions() -> BTreeMap<String, AliasSet> {
    [
        ("enfermedad_renal", alias_set("Enfermedad renal", &[
            "renal", "rinon", "insuficiencia renal", "nefropatia", "dialisis",
        ])),
        ("hemocromatosis", alias_set("Hemocromatosis", &[
            "hemocromatosis", "sobrecarga de hierro", "exceso de hierro",
        ])),
        ("trastorno_tiroideo", alias_set("Trastorno tiroideo", &[
            "tiroides", "tiroideo", "hipertiroidismo", "hipotiroidismo", "hashimoto",
            "graves",
        ])),
        ("enfermedad_hepatica", alias_set("Enfermedad hepática", &[
            "hepatica", "higado", "cirrosis", "hepatitis",
        ])),
        ("trastorno_hemorragico", alias_set("Trastorno hemorrágico", &[
            "hemorragico", "hemofilia", "coagulacion", "sangrado",
        ])),
        ("calculos_renales", alias_set("Cálculos renales", &[
            "calculos renales", "litiasis", "piedras en el rinon", "calculo renal",
        ])),
        ("hipercalcemia", alias_set("Hipercalcemia", &[
            "hipercalcemia", "calcio alto", "hiperparatiroidismo",
        ])),
        ("cirugia_programada", alias_set("Cirugía programada", &[
            "cirugia", "operacion", "intervencion quirurgica",
        ])),
    ]
    .into_iter()
    .map(|(id, set)| (id.to_string(), set))
    .collect()
}

fn upper_limits() -> BTreeMap<String, UpperLimitRule> {
    [
        ("Vitamina D", limit(Unit::INTERNATIONAL_UNIT, 4000.0, 10000.0,
            Some("Dosis superiores a corto plazo solo para corregir deficiencia documentada"))),
        ("Vitamina A", limit(Unit::MCG_RAE, 3000.0, 3000.0,
            Some("Aplica a retinol preformado; el betacaroteno no tiene límite establecido"))),
        ("Vitamina C", limit(Unit::MILLIGRAM, 2000.0, 3000.0, None)),
        ("Vitamina E", limit(Unit::MILLIGRAM, 1000.0, 1000.0, None)),
        ("Vitamina B6", limit(Unit::MILLIGRAM, 100.0, 200.0,
            Some("Riesgo de neuropatía periférica con uso prolongado"))),
        ("Ácido fólico", limit(Unit::MICROGRAM, 1000.0, 5000.0,
            Some("Límite de forma sintética; puede enmascarar déficit de B12"))),
        ("Magnesio", limit(Unit::MG_SUPPLEMENTAL, 350.0, 500.0,
            Some("Solo magnesio de suplementos, no de alimentos"))),
        ("Zinc", limit(Unit::MILLIGRAM, 40.0, 75.0, None)),
        ("Hierro", limit(Unit::MG_ELEMENTAL_IRON, 45.0, 120.0, None)),
        ("Calcio", limit(Unit::MILLIGRAM, 2500.0, 3000.0, None)),
        ("Selenio", limit(Unit::MICROGRAM, 400.0, 400.0, None)),
        ("Yodo", limit(Unit::MICROGRAM, 1100.0, 1100.0, None)),
        ("Omega-3 (EPA y DHA)", limit(Unit::MG_COMBINED, 3000.0, 5000.0, None)),
        ("Melatonina", limit(Unit::MILLIGRAM, 5.0, 10.0, None)),
        ("Potasio", limit(Unit::MILLIGRAM, 99.0, 99.0,
            Some("Límite habitual de suplementos de venta libre"))),
    ]
    .into_iter()
    .map(|(name, rule)| (name.to_string(), rule))
    .collect()
}

fn contraindications() -> BTreeMap<String, Vec<ContraindicationRule>> {
    const CONSULT: &str = "Consulte a su médico antes de iniciar este suplemento.";

    [
        ("Omega-3 (EPA y DHA)", vec![
            rule(medication("anticoagulantes"), Severity::Major,
                "Los omega-3 potencian el efecto de los anticoagulantes y aumentan el riesgo de sangrado.",
                "No inicie omega-3 sin supervisión médica; puede requerir control de INR."),
            rule(medication("antiagregantes"), Severity::Moderate,
                "Los omega-3 combinados con antiagregantes pueden aumentar el riesgo de sangrado.",
                CONSULT),
            rule(condition("trastorno_hemorragico"), Severity::Major,
                "Los omega-3 en dosis altas pueden agravar trastornos de la coagulación.",
                CONSULT),
            rule(condition("cirugia_programada"), Severity::Moderate,
                "Los omega-3 pueden aumentar el sangrado quirúrgico.",
                "Suspenda el suplemento 1-2 semanas antes de la cirugía, según indique su médico."),
        ]),
        ("Vitamina A", vec![
            rule(Trigger::Pregnancy, Severity::Critical,
                "CONTRAINDICADO en embarazo: la vitamina A preformada en dosis altas es teratogénica.",
                "No tome suplementos de vitamina A (retinol) durante el embarazo salvo prescripción médica."),
            rule(condition("enfermedad_hepatica"), Severity::Major,
                "La vitamina A se acumula en el hígado y puede agravar una enfermedad hepática.",
                CONSULT),
        ]),
        ("Vitamina K", vec![
            rule(medication("anticoagulantes"), Severity::Major,
                "La vitamina K antagoniza el efecto de los anticoagulantes antivitamina K (warfarina, acenocumarol).",
                "No tome vitamina K sin que su médico ajuste y controle el tratamiento anticoagulante."),
        ]),
        ("Hierba de San Juan", vec![
            rule(medication("antidepresivos"), Severity::Critical,
                "Riesgo de síndrome serotoninérgico al combinar hierba de San Juan con antidepresivos.",
                "No combine hierba de San Juan con antidepresivos."),
            rule(medication("anticonceptivos"), Severity::Major,
                "La hierba de San Juan reduce la eficacia de los anticonceptivos hormonales.",
                "Utilice un método anticonceptivo alternativo y consulte a su médico."),
            rule(medication("anticoagulantes"), Severity::Major,
                "La hierba de San Juan reduce los niveles de anticoagulantes orales.",
                CONSULT),
            rule(medication("inmunosupresores"), Severity::Critical,
                "La hierba de San Juan reduce los niveles de inmunosupresores y puede provocar rechazo de trasplante.",
                "No combine hierba de San Juan con inmunosupresores."),
            rule(Trigger::Pregnancy, Severity::Major,
                "No hay datos de seguridad de la hierba de San Juan en embarazo.",
                CONSULT),
        ]),
        ("Ginkgo biloba", vec![
            rule(medication("anticoagulantes"), Severity::Major,
                "El ginkgo aumenta el riesgo de sangrado con anticoagulantes.",
                CONSULT),
            rule(medication("antiagregantes"), Severity::Major,
                "El ginkgo aumenta el riesgo de sangrado con antiagregantes.",
                CONSULT),
            rule(condition("cirugia_programada"), Severity::Moderate,
                "El ginkgo puede aumentar el sangrado quirúrgico.",
                "Suspenda el ginkgo al menos 36 horas antes de la cirugía."),
        ]),
        ("Ashwagandha", vec![
            rule(Trigger::Pregnancy, Severity::Critical,
                "CONTRAINDICADO en embarazo: la ashwagandha puede inducir contracciones uterinas.",
                "No tome ashwagandha durante el embarazo."),
            rule(Trigger::Breastfeeding, Severity::Major,
                "No hay datos de seguridad de la ashwagandha durante la lactancia.",
                CONSULT),
            rule(condition("trastorno_tiroideo"), Severity::Major,
                "La ashwagandha puede aumentar los niveles de hormona tiroidea.",
                "Requiere control de función tiroidea por su médico."),
            rule(medication("levotiroxina"), Severity::Moderate,
                "La ashwagandha puede potenciar el efecto de la levotiroxina.",
                CONSULT),
            rule(medication("sedantes"), Severity::Moderate,
                "La ashwagandha puede potenciar el efecto de sedantes.",
                CONSULT),
            rule(medication("inmunosupresores"), Severity::Major,
                "La ashwagandha puede estimular el sistema inmune y contrarrestar inmunosupresores.",
                CONSULT),
        ]),
        ("Melatonina", vec![
            rule(medication("sedantes"), Severity::Moderate,
                "La melatonina potencia el efecto de sedantes e hipnóticos.",
                "Evite conducir y consulte a su médico antes de combinarlos."),
            rule(medication("anticoagulantes"), Severity::Moderate,
                "La melatonina puede aumentar el efecto de los anticoagulantes.",
                CONSULT),
            rule(Trigger::Pregnancy, Severity::Major,
                "No hay datos suficientes de seguridad de la melatonina en embarazo.",
                CONSULT),
            rule(Trigger::AgeBelow { years: 18 }, Severity::Major,
                "La melatonina en menores de edad requiere indicación pediátrica.",
                "Consulte con el pediatra antes de administrar melatonina."),
        ]),
        ("Potasio", vec![
            rule(medication("ieca_ara2"), Severity::Major,
                "Los IECA y ARA-II elevan el potasio; suplementar puede causar hiperpotasemia.",
                "No tome potasio sin control de niveles en sangre por su médico."),
            rule(medication("ahorradores_potasio"), Severity::Critical,
                "Riesgo de hiperpotasemia grave con diuréticos ahorradores de potasio.",
                "No tome suplementos de potasio con este tratamiento."),
            rule(condition("enfermedad_renal"), Severity::Critical,
                "Con enfermedad renal el potasio se acumula y puede provocar arritmias graves.",
                "No tome suplementos de potasio sin indicación de su nefrólogo."),
        ]),
        ("Magnesio", vec![
            rule(condition("enfermedad_renal"), Severity::Major,
                "Con enfermedad renal el magnesio puede acumularse.",
                CONSULT),
            rule(medication("antibioticos_quelables"), Severity::Moderate,
                "El magnesio reduce la absorción de quinolonas y tetraciclinas.",
                "Separe la toma al menos 2 horas del antibiótico."),
            rule(medication("bisfosfonatos"), Severity::Moderate,
                "El magnesio reduce la absorción de bisfosfonatos.",
                "Separe la toma al menos 2 horas del bisfosfonato."),
        ]),
        ("Hierro", vec![
            rule(condition("hemocromatosis"), Severity::Critical,
                "CONTRAINDICADO con hemocromatosis: el hierro agrava la sobrecarga.",
                "No tome suplementos de hierro."),
            rule(Trigger::Gender { gender: Gender::Hombre }, Severity::Moderate,
                "Los hombres rara vez necesitan suplementar hierro y tienen riesgo de sobrecarga.",
                "Suplemente hierro solo con una analítica que confirme déficit."),
            rule(medication("levotiroxina"), Severity::Moderate,
                "El hierro reduce la absorción de la levotiroxina.",
                "Separe la toma al menos 4 horas de la levotiroxina."),
            rule(medication("antibioticos_quelables"), Severity::Moderate,
                "El hierro reduce la absorción de quinolonas y tetraciclinas.",
                "Separe la toma al menos 2 horas del antibiótico."),
            rule(medication("ibp"), Severity::Minor,
                "Los inhibidores de la bomba de protones reducen la absorción del hierro.",
                "Puede requerir una forma de hierro mejor absorbida; consulte a su médico."),
        ]),
        ("Calcio", vec![
            rule(medication("levotiroxina"), Severity::Moderate,
                "El calcio reduce la absorción de la levotiroxina.",
                "Separe la toma al menos 4 horas de la levotiroxina."),
            rule(medication("bisfosfonatos"), Severity::Moderate,
                "El calcio reduce la absorción de bisfosfonatos.",
                "Tome el bisfosfonato en ayunas y el calcio al menos 30 minutos después."),
            rule(medication("antibioticos_quelables"), Severity::Moderate,
                "El calcio reduce la absorción de quinolonas y tetraciclinas.",
                "Separe la toma al menos 2 horas del antibiótico."),
            rule(condition("hipercalcemia"), Severity::Critical,
                "CONTRAINDICADO con hipercalcemia.",
                "No tome suplementos de calcio."),
            rule(condition("calculos_renales"), Severity::Major,
                "Los suplementos de calcio pueden favorecer cálculos renales.",
                CONSULT),
        ]),
        ("Zinc", vec![
            rule(medication("antibioticos_quelables"), Severity::Moderate,
                "El zinc reduce la absorción de quinolonas y tetraciclinas.",
                "Separe la toma al menos 2 horas del antibiótico."),
        ]),
        ("Yodo", vec![
            rule(condition("trastorno_tiroideo"), Severity::Major,
                "El yodo puede descompensar un trastorno tiroideo.",
                "Tome yodo solo con indicación de su endocrinólogo."),
        ]),
        ("Coenzima Q10", vec![
            rule(medication("anticoagulantes"), Severity::Moderate,
                "La coenzima Q10 puede reducir el efecto de la warfarina.",
                "Requiere control de INR si se combina con anticoagulantes."),
        ]),
        ("Vitamina E", vec![
            rule(medication("anticoagulantes"), Severity::Major,
                "La vitamina E en dosis altas aumenta el riesgo de sangrado con anticoagulantes.",
                CONSULT),
        ]),
        ("Cúrcuma", vec![
            rule(medication("anticoagulantes"), Severity::Major,
                "La cúrcuma puede aumentar el riesgo de sangrado con anticoagulantes.",
                CONSULT),
            rule(Trigger::Pregnancy, Severity::Moderate,
                "Las dosis de suplemento de cúrcuma no están estudiadas en embarazo.",
                CONSULT),
        ]),
    ]
    .into_iter()
    .map(|(name, rules)| (name.to_string(), rules))
    .collect()
}

fn depletions() -> BTreeMap<String, Vec<DepletionRule>> {
    [
        ("metformina", vec![
            depletion("Vitamina B12", "Reduce la absorción intestinal de B12"),
        ]),
        ("ibp", vec![
            depletion("Vitamina B12", "La menor acidez gástrica impide liberar B12 de los alimentos"),
            depletion("Magnesio", "Reduce la absorción intestinal de magnesio"),
            depletion("Calcio", "Reduce la absorción de carbonato de calcio"),
        ]),
        ("estatinas", vec![
            depletion("Coenzima Q10", "Bloquean la vía de síntesis de la coenzima Q10"),
        ]),
        ("diureticos_tiazidicos", vec![
            depletion("Magnesio", "Aumentan la excreción renal"),
            depletion("Potasio", "Aumentan la excreción renal"),
            depletion("Zinc", "Aumentan la excreción renal"),
        ]),
        ("diureticos_asa", vec![
            depletion("Magnesio", "Aumentan la excreción renal"),
            depletion("Potasio", "Aumentan la excreción renal"),
            depletion("Calcio", "Aumentan la excreción renal"),
            depletion("Tiamina", "Aumentan la excreción renal"),
        ]),
        ("corticoides", vec![
            depletion("Calcio", "Reducen la absorción y aumentan la excreción"),
            depletion("Vitamina D", "Alteran su metabolismo"),
            depletion("Potasio", "Aumentan la excreción renal"),
        ]),
        ("anticonceptivos", vec![
            depletion("Vitamina B6", "Alteran su metabolismo"),
            depletion("Ácido fólico", "Reducen sus niveles séricos"),
            depletion("Magnesio", "Reducen sus niveles séricos"),
        ]),
        ("anticonvulsivos", vec![
            depletion("Vitamina D", "Aceleran su metabolismo hepático"),
            depletion("Ácido fólico", "Reducen su absorción"),
            depletion("Calcio", "Secundario al déficit de vitamina D"),
        ]),
        ("metotrexato", vec![
            depletion("Ácido fólico", "Antagonista del folato"),
        ]),
    ]
    .into_iter()
    .map(|(category, rules)| (category.to_string(), rules))
    .collect()
}

fn preferred_forms() -> BTreeMap<String, PreferredForm> {
    [
        ("Hierro", form("bisglicinato de hierro",
            "Mejor absorción y menos molestias digestivas que el sulfato ferroso")),
        ("Magnesio", form("citrato o bisglicinato de magnesio",
            "Mejor biodisponibilidad que el óxido de magnesio")),
        ("Zinc", form("picolinato o bisglicinato de zinc",
            "Mejor absorción que el óxido de zinc")),
        ("Vitamina D", form("vitamina D3 (colecalciferol)",
            "Eleva los niveles séricos de forma más eficaz que la D2")),
        ("Vitamina B12", form("metilcobalamina",
            "Forma activa, no requiere conversión")),
        ("Ácido fólico", form("metilfolato (5-MTHF)",
            "Forma activa, útil con variantes del gen MTHFR")),
        ("Calcio", form("citrato de calcio",
            "Se absorbe sin necesidad de ácido gástrico")),
        ("Omega-3 (EPA y DHA)", form("triglicéridos reesterificados con certificación IFOS",
            "Mejor absorción y control de metales pesados")),
        ("Coenzima Q10", form("ubiquinol",
            "Forma reducida de mayor biodisponibilidad")),
        ("Vitamina E", form("tocoferoles mixtos de origen natural (d-alfa)",
            "Mayor actividad biológica que la forma sintética dl-alfa")),
    ]
    .into_iter()
    .map(|(name, form)| (name.to_string(), form))
    .collect()
}

fn nutrient_conflicts() -> Vec<NutrientConflictRule> {
    vec![
        conflict("Calcio", "Hierro",
            "El calcio reduce la absorción del hierro si se toman juntos.",
            "Tome el hierro y el calcio separados al menos 2 horas."),
        conflict("Calcio", "Zinc",
            "El calcio en dosis altas reduce la absorción del zinc.",
            "Tome el zinc y el calcio en momentos distintos del día."),
        conflict("Zinc", "Hierro",
            "El zinc y el hierro compiten por la absorción intestinal.",
            "Separe la toma de zinc y hierro al menos 2 horas."),
        conflict("Calcio", "Magnesio",
            "El calcio y el magnesio en dosis altas compiten por la absorción.",
            "Reparta las tomas de calcio y magnesio a lo largo del día."),
    ]
}

fn build() -> RuleTables {
    RuleTables {
        tables_version: BUILTIN_TABLES_VERSION.to_string(),
        medication_categories: medication_categories(),
        conditions: conditions(),
        upper_limits: upper_limits(),
        contraindications: contraindications(),
        depletions: depletions(),
        preferred_forms: preferred_forms(),
        nutrient_conflicts: nutrient_conflicts(),
    }
}
